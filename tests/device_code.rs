use sent_mail_labeler::auth::MAIL_READ_SCOPE;
use sent_mail_labeler::{DeviceCodeFlow, Error, TokenProvider};
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DEVICE_CODE_PATH: &str = "/common/oauth2/v2.0/devicecode";
const TOKEN_PATH: &str = "/common/oauth2/v2.0/token";

async fn mount_device_code(server: &MockServer, expires_in: u64) {
    Mock::given(method("POST"))
        .and(path(DEVICE_CODE_PATH))
        .and(body_string_contains("client_id=client-123"))
        .and(body_string_contains("scope=Mail.Read"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "device_code": "DEV-CODE",
            "user_code": "ABCD-EFGH",
            "verification_uri": "https://microsoft.com/devicelogin",
            "expires_in": expires_in,
            "interval": 0,
            "message": "To sign in, use a web browser to open the page https://microsoft.com/devicelogin and enter the code ABCD-EFGH to authenticate."
        })))
        .expect(1)
        .mount(server)
        .await;
}

fn flow(server: &MockServer) -> DeviceCodeFlow {
    DeviceCodeFlow::new(server.uri(), "common", "client-123")
}

#[tokio::test]
async fn polls_until_user_completes_sign_in() {
    let server = MockServer::start().await;
    mount_device_code(&server, 900).await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "authorization_pending",
            "error_description": "AADSTS70016: pending"
        })))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("device_code=DEV-CODE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token_type": "Bearer",
            "scope": "Mail.Read",
            "expires_in": 3599,
            "access_token": "eyJ.mail.read"
        })))
        .with_priority(2)
        .expect(1)
        .mount(&server)
        .await;

    let token = flow(&server)
        .acquire_token(&[MAIL_READ_SCOPE])
        .await
        .unwrap();
    assert_eq!(token.secret(), "eyJ.mail.read");

    let token_polls = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|request| request.url.path() == TOKEN_PATH)
        .count();
    assert_eq!(token_polls, 3);
}

#[tokio::test]
async fn declined_sign_in_is_auth_error() {
    let server = MockServer::start().await;
    mount_device_code(&server, 900).await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "authorization_declined",
            "error_description": "The end user denied the authorization request."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = flow(&server)
        .acquire_token(&[MAIL_READ_SCOPE])
        .await
        .unwrap_err();
    match err {
        Error::Auth(message) => assert!(message.contains("authorization_declined"), "{message}"),
        other => panic!("expected auth error, got {other:?}"),
    }
}

#[tokio::test]
async fn expired_device_code_is_auth_error() {
    let server = MockServer::start().await;
    mount_device_code(&server, 0).await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "authorization_pending"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = flow(&server)
        .acquire_token(&[MAIL_READ_SCOPE])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Auth(_)), "{err:?}");
}

#[tokio::test]
async fn rejected_client_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(DEVICE_CODE_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "unauthorized_client",
            "error_description": "AADSTS700016: Application not found."
        })))
        .mount(&server)
        .await;

    let err = flow(&server)
        .acquire_token(&[MAIL_READ_SCOPE])
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "authentication failed: unauthorized_client (HTTP 400): AADSTS700016: Application not found."
    );
}
