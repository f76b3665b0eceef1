#[cfg(test)]
mod tests {
    use hyper::HeaderMap;
    use crate::config::Config;
    use crate::middleware::{add_cors_headers, with_credential};
    use crate::models::{AppState, Credential};

    fn state(allow_user_tokens: bool) -> AppState {
        let mut config = Config::new("APPKEY");
        config.allow_user_tokens = allow_user_tokens;
        AppState::new(config).unwrap()
    }

    #[test]
    fn test_add_cors_headers() {
        let mut headers = HeaderMap::new();
        add_cors_headers(&mut headers);

        assert_eq!(
            headers.get("access-control-allow-origin").unwrap(),
            "*"
        );
        assert_eq!(
            headers.get("access-control-allow-methods").unwrap(),
            "GET, POST, OPTIONS"
        );
        assert_eq!(
            headers.get("access-control-allow-headers").unwrap(),
            "Content-Type, X-Access-Token"
        );
    }

    #[tokio::test]
    async fn test_header_token_selects_bearer() {
        let credential = warp::test::request()
            .header("X-Access-Token", "user-token")
            .filter(&with_credential(state(true)))
            .await
            .unwrap();
        assert_eq!(credential, Credential::BearerToken("user-token".to_string()));
    }

    #[tokio::test]
    async fn test_missing_or_placeholder_token_selects_app_key() {
        let filter = with_credential(state(true));

        let credential = warp::test::request().filter(&filter).await.unwrap();
        assert_eq!(credential, Credential::ApplicationKey("APPKEY".to_string()));

        let credential = warp::test::request()
            .header("X-Access-Token", "null")
            .filter(&filter)
            .await
            .unwrap();
        assert_eq!(credential, Credential::ApplicationKey("APPKEY".to_string()));
    }

    #[tokio::test]
    async fn test_minimal_variant_ignores_header() {
        let credential = warp::test::request()
            .header("X-Access-Token", "user-token")
            .filter(&with_credential(state(false)))
            .await
            .unwrap();
        assert_eq!(credential, Credential::ApplicationKey("APPKEY".to_string()));
    }
}
