//! Integration tests for the Resource Manager adapter using wiremock
//!
//! Each test mounts the endpoint the adapter should call, checks the exact
//! path and body it sends, and that the mocked response comes back unchanged.

use gcrm::gcp::auth::GcpCredentials;
use gcrm::gcp::client::{format_gcp_error, GcpClient};
use gcrm::resourcemanager::{ResourceManager, ResourceNameError};
use serde_json::{json, Value};
use wiremock::matchers::{any, bearer_token, body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn manager(server: &MockServer) -> ResourceManager {
    let client = GcpClient::with_credentials(
        GcpCredentials::from_static_token("test-token"),
        "fake-project",
    )
    .expect("client should build")
    .with_endpoint(&server.uri());
    ResourceManager::new(client)
}

fn mock_project() -> Value {
    json!({
        "createTime": "2020-01-01T00:00:00.000Z",
        "displayName": "fake-project",
        "etag": "Tm90IGFuIGV0YWd4eHh4eA==",
        "name": "projects/000000000000",
        "parent": "folders/111111111111",
        "projectId": "fake-project",
        "state": "ACTIVE",
        "updateTime": "2020-01-01T00:00:00.000Z"
    })
}

fn mock_folder() -> Value {
    json!({
        "createTime": "2020-01-01T00:00:00.000Z",
        "displayName": "fake-folder",
        "etag": "Tm90IGFuIGV0YWd4eHh4eA==",
        "name": "folders/111111111111",
        "parent": "organizations/222222222222",
        "state": "ACTIVE",
        "updateTime": "2020-01-01T00:00:00.000Z"
    })
}

fn mock_organization() -> Value {
    json!({
        "createTime": "2020-01-01T00:00:00.000Z",
        "directoryCustomerId": "bm9jdXN0",
        "displayName": "fake-organization.com",
        "etag": "Tm90IGFuIGV0YWd4eHh4eA==",
        "name": "organizations/222222222222",
        "state": "ACTIVE",
        "updateTime": "2020-01-01T00:00:00.000Z"
    })
}

fn mock_iam_policy() -> Value {
    json!({
        "version": 1,
        "etag": "bm90X2V0YWc=",
        "bindings": [
            {
                "role": "roles/cloudbuild.builds.builder",
                "members": [
                    "serviceAccount:012345678901@cloudbuild.gserviceaccount.com"
                ]
            },
            {
                "role": "roles/owner",
                "members": [
                    "serviceAccount:fake_sa@fake-project.iam.gserviceaccount.com",
                    "user:fakeaccount@fakedomain.com"
                ]
            }
        ]
    })
}

fn mock_org_policy() -> Value {
    json!({
        "constraint": "constraints/testpolicy",
        "etag": "abcdefghijk="
    })
}

async fn mount_get(server: &MockServer, at: &str, record: Value) {
    Mock::given(method("GET"))
        .and(path(at))
        .and(bearer_token("test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(record))
        .expect(1)
        .mount(server)
        .await;
}

mod resource_tests {
    use super::*;

    #[tokio::test]
    async fn test_get_resource_returns_record() {
        let server = MockServer::start().await;
        mount_get(&server, "/v3/projects/000000000000", mock_project()).await;

        let response = manager(&server)
            .get_resource("projects/000000000000")
            .await
            .expect("get_resource should succeed");

        assert_eq!(response, mock_project());
    }

    #[tokio::test]
    async fn test_get_resource_dispatches_on_type() {
        let server = MockServer::start().await;
        mount_get(&server, "/v3/folders/111111111111", mock_folder()).await;
        mount_get(&server, "/v3/organizations/222222222222", mock_organization()).await;

        let manager = manager(&server);
        let folder = manager.get_resource("folders/111111111111").await.unwrap();
        let org = manager
            .get_resource("organizations/222222222222")
            .await
            .unwrap();

        assert_eq!(folder["displayName"], "fake-folder");
        assert_eq!(org["directoryCustomerId"], "bm9jdXN0");
    }

    #[tokio::test]
    async fn test_get_resource_invalid_name_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let err = manager(&server)
            .get_resource("badtype/000000000000")
            .await
            .expect_err("bad resource type must be rejected");

        assert_eq!(
            err.downcast_ref::<ResourceNameError>(),
            Some(&ResourceNameError::UnknownType("badtype".to_string()))
        );
        let requests = server.received_requests().await.unwrap();
        assert!(requests.is_empty());
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v3/projects/restricted"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": {"code": 403, "message": "Permission denied", "status": "PERMISSION_DENIED"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = manager(&server)
            .get_resource("projects/restricted")
            .await
            .expect_err("403 must surface as an error");

        assert!(err.to_string().contains("403"));
        assert_eq!(
            format_gcp_error(&err),
            "Permission denied. Check your GCP IAM permissions."
        );
    }
}

mod ancestry_tests {
    use super::*;

    #[tokio::test]
    async fn test_project_ancestry_walks_to_root() {
        let server = MockServer::start().await;
        mount_get(&server, "/v3/projects/fake-project", mock_project()).await;
        mount_get(&server, "/v3/folders/111111111111", mock_folder()).await;
        mount_get(&server, "/v3/organizations/222222222222", mock_organization()).await;

        let ancestry = manager(&server)
            .project_ancestry(None)
            .await
            .expect("ancestry should resolve");

        assert_eq!(
            ancestry,
            vec![mock_project(), mock_folder(), mock_organization()]
        );
    }

    #[tokio::test]
    async fn test_ancestry_from_explicit_folder() {
        let server = MockServer::start().await;
        mount_get(&server, "/v3/folders/111111111111", mock_folder()).await;
        mount_get(&server, "/v3/organizations/222222222222", mock_organization()).await;

        let ancestry = manager(&server)
            .project_ancestry(Some("folders/111111111111"))
            .await
            .unwrap();

        assert_eq!(ancestry.len(), 2);
        assert_eq!(ancestry[1]["name"], "organizations/222222222222");
    }

    #[tokio::test]
    async fn test_ancestry_of_root_is_single_record() {
        let server = MockServer::start().await;
        mount_get(&server, "/v3/organizations/222222222222", mock_organization()).await;

        let ancestry = manager(&server)
            .project_ancestry(Some("organizations/222222222222"))
            .await
            .unwrap();

        assert_eq!(ancestry, vec![mock_organization()]);
    }

    #[tokio::test]
    async fn test_ancestry_cycle_is_an_error() {
        let server = MockServer::start().await;
        let mut looping_folder = mock_folder();
        looping_folder["parent"] = json!("projects/000000000000");
        mount_get(&server, "/v3/projects/000000000000", mock_project()).await;
        mount_get(&server, "/v3/folders/111111111111", looping_folder).await;

        let err = manager(&server)
            .project_ancestry(Some("projects/000000000000"))
            .await
            .expect_err("cycle must not loop forever");

        assert!(err.to_string().contains("cycle"));
    }

    #[tokio::test]
    async fn test_ancestry_cycle_with_numeric_ids_keeps_its_message() {
        let server = MockServer::start().await;
        let mut project = mock_project();
        project["name"] = json!("projects/1403");
        project["parent"] = json!("folders/1500");
        let mut folder = mock_folder();
        folder["name"] = json!("folders/1500");
        folder["parent"] = json!("projects/1403");
        mount_get(&server, "/v3/projects/1403", project).await;
        mount_get(&server, "/v3/folders/1500", folder).await;

        let err = manager(&server)
            .project_ancestry(Some("projects/1403"))
            .await
            .expect_err("cycle must not loop forever");

        assert_eq!(
            format_gcp_error(&err),
            "Ancestry cycle detected at projects/1403"
        );
    }

    #[tokio::test]
    async fn test_ancestry_non_string_parent_is_an_error() {
        let server = MockServer::start().await;
        let mut project = mock_project();
        project["parent"] = json!({"type": "folder", "id": "111111111111"});
        mount_get(&server, "/v3/projects/000000000000", project).await;

        let err = manager(&server)
            .project_ancestry(Some("projects/000000000000"))
            .await
            .expect_err("structured parent must be rejected");

        assert!(err
            .to_string()
            .starts_with("Unexpected parent value on projects/000000000000"));
    }

    #[tokio::test]
    async fn test_ancestry_invalid_parent_name_is_an_error() {
        let server = MockServer::start().await;
        let mut project = mock_project();
        project["parent"] = json!("billingAccounts/1");
        mount_get(&server, "/v3/projects/000000000000", project).await;

        let err = manager(&server)
            .project_ancestry(Some("projects/000000000000"))
            .await
            .expect_err("parent outside the three collections must be rejected");

        assert_eq!(
            err.downcast_ref::<ResourceNameError>(),
            Some(&ResourceNameError::UnknownType("billingAccounts".to_string()))
        );
        // nothing is requested past the bad parent
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }
}

mod iam_policy_tests {
    use super::*;

    #[tokio::test]
    async fn test_get_iam_policy() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/projects/000000000000:getIamPolicy"))
            .and(bearer_token("test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(mock_iam_policy()))
            .expect(1)
            .mount(&server)
            .await;

        let response = manager(&server)
            .get_iam_policy("projects/000000000000")
            .await
            .unwrap();

        assert_eq!(response, mock_iam_policy());
    }
}

mod org_policy_tests {
    use super::*;

    #[tokio::test]
    async fn test_get_org_policy() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/projects/000000000000:getOrgPolicy"))
            .and(body_json(json!({"constraint": "constraints/fake-policy"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(mock_org_policy()))
            .expect(1)
            .mount(&server)
            .await;

        let response = manager(&server)
            .get_org_policy("projects/000000000000", "fake-policy")
            .await
            .unwrap();

        assert_eq!(response, mock_org_policy());
    }

    #[tokio::test]
    async fn test_list_org_policy() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/projects/000000000000:listOrgPolicies"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "policies": [
                    {"constraint": "constraints/testpolicy1", "etag": "abcdefghijk="},
                    {"constraint": "constraints/testpolicy2", "etag": "lmnopqrstuv="}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = manager(&server)
            .list_org_policy("projects/000000000000")
            .await
            .unwrap();

        assert_eq!(response["policies"].as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn test_list_all_org_policies_follows_pages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/folders/111111111111:listOrgPolicies"))
            .and(body_json(json!({})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "policies": [{"constraint": "constraints/a"}],
                "nextPageToken": "page-2"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/folders/111111111111:listOrgPolicies"))
            .and(body_json(json!({"pageToken": "page-2"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "policies": [{"constraint": "constraints/b"}, {"constraint": "constraints/c"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let policies = manager(&server)
            .list_all_org_policies("folders/111111111111")
            .await
            .unwrap();

        let constraints: Vec<&str> = policies
            .iter()
            .filter_map(|p| p["constraint"].as_str())
            .collect();
        assert_eq!(
            constraints,
            vec!["constraints/a", "constraints/b", "constraints/c"]
        );
    }

    #[tokio::test]
    async fn test_list_all_org_policies_stops_on_repeated_page_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/projects/000000000000:listOrgPolicies"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "policies": [{"constraint": "constraints/a"}],
                "nextPageToken": "same"
            })))
            .expect(2)
            .mount(&server)
            .await;

        let err = manager(&server)
            .list_all_org_policies("projects/000000000000")
            .await
            .expect_err("a repeating page token must not loop forever");

        assert!(err.to_string().contains("page token 'same' repeated"));
    }

    #[tokio::test]
    async fn test_set_org_policy_embeds_etag() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/projects/000000000000:setOrgPolicy"))
            .and(body_json(json!({
                "policy": {
                    "constraint": "constraints/compute.storageResourceUseRestrictions",
                    "listPolicy": {"inheritFromParent": false, "allValues": "ALLOW"},
                    "etag": "abc123"
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(mock_org_policy()))
            .expect(1)
            .mount(&server)
            .await;

        let policy = json!({
            "constraint": "constraints/compute.storageResourceUseRestrictions",
            "listPolicy": {"inheritFromParent": false, "allValues": "ALLOW"}
        });
        let response = manager(&server)
            .set_org_policy("projects/000000000000", &policy, "abc123")
            .await
            .unwrap();

        assert_eq!(response, mock_org_policy());
    }

    #[tokio::test]
    async fn test_delete_org_policy() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/projects/000000000000:clearOrgPolicy"))
            .and(body_json(json!({
                "constraint": "constraints/fake-policy",
                "etag": "abc123"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let response = manager(&server)
            .delete_org_policy("projects/000000000000", "fake-policy", "abc123")
            .await
            .unwrap();

        assert_eq!(response, json!({}));
    }

    #[tokio::test]
    async fn test_org_policy_calls_validate_name_first() {
        let server = MockServer::start().await;

        let manager = manager(&server);
        assert!(manager
            .delete_org_policy("billingAccounts/1", "fake-policy", "abc123")
            .await
            .is_err());
        assert!(manager.list_org_policy("projects").await.is_err());

        let requests = server.received_requests().await.unwrap();
        assert!(requests.is_empty());
    }
}
