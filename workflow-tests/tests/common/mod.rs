//! Common test utilities for workflow tests.

use workflow_tests::WorkflowTestContext;

pub const TOKEN: &str = "workflow-token";

/// Fresh context, logged in through the mocked login route.
pub async fn setup() -> WorkflowTestContext {
    let ctx = WorkflowTestContext::new()
        .await
        .expect("Failed to create workflow test context");

    ctx.backend.mount_login(TOKEN, "Ana").await;
    ctx.state
        .auth
        .login(&chat_client::models::user::LoginRequest {
            email: "user@example.com".to_string(),
            password: "segredo".to_string(),
        })
        .await
        .expect("Login failed");

    ctx
}
