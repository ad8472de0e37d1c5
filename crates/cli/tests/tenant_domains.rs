//! Tenant domain resolver against a mocked federation metadata endpoint.

use m365_inventory::config::TenantMetadataConfig;
use m365_inventory::services::{TenantDomainResolver, TenantLookupError};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn resolver(server: &MockServer) -> TenantDomainResolver {
    TenantDomainResolver::new(&TenantMetadataConfig {
        base_url: server.uri(),
        timeout_secs: 5,
    })
    .unwrap()
}

fn names(resolved: &[domain::models::DomainRecord]) -> Vec<&str> {
    resolved.iter().map(|d| d.name.as_str()).collect()
}

#[tokio::test]
async fn resolves_domains_from_audiences() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/contoso.com/metadata/json/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "issuer": "00000001-0000-0000-c000-000000000000@72f988bf",
            "allowedAudiences": [
                "00000001-0000-0000-c000-000000000000/accounts.accesscontrol.windows.net@contoso.com",
                "00000001-0000-0000-c000-000000000000/accounts.accesscontrol.windows.net@contoso.onmicrosoft.com",
                "00000001-0000-0000-c000-000000000000/accounts.accesscontrol.windows.net@72f988bf",
                "00000001-0000-0000-c000-000000000000/accounts.accesscontrol.windows.net@fabrikam.net"
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resolved = resolver(&server).resolve("contoso.com").await;
    assert_eq!(
        names(&resolved),
        vec!["contoso.com", "contoso.onmicrosoft.com", "fabrikam.net"]
    );
    assert_eq!(
        serde_json::to_value(&resolved[0]).unwrap(),
        json!({ "Name": "contoso.com" })
    );
}

#[tokio::test]
async fn tenant_without_audiences_is_empty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/contoso.com/metadata/json/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "allowedAudiences": [] })))
        .mount(&server)
        .await;

    assert!(resolver(&server).resolve("contoso.com").await.is_empty());
}

#[tokio::test]
async fn bad_request_means_not_a_tenant() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/example.com/metadata/json/1"))
        .respond_with(ResponseTemplate::new(400).set_body_string("AADSTS90002"))
        .mount(&server)
        .await;

    let resolver = resolver(&server);
    assert!(matches!(
        resolver.fetch_metadata("example.com").await,
        Err(TenantLookupError::ExpectedNonFatal(_))
    ));
    assert!(resolver.resolve("example.com").await.is_empty());
}

#[tokio::test]
async fn server_error_is_transport_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/contoso.com/metadata/json/1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let resolver = resolver(&server);
    assert!(matches!(
        resolver.fetch_metadata("contoso.com").await,
        Err(TenantLookupError::Transport(_))
    ));
    assert!(resolver.resolve("contoso.com").await.is_empty());
}

#[tokio::test]
async fn unreadable_body_is_unknown_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/contoso.com/metadata/json/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let resolver = resolver(&server);
    assert!(matches!(
        resolver.fetch_metadata("contoso.com").await,
        Err(TenantLookupError::Unknown(_))
    ));
    assert!(resolver.resolve("contoso.com").await.is_empty());
}
