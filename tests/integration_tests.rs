//! Integration tests for the Glaucus library.
//! These tests require an API key in the environment to run.

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use glaucus::{ChatCompletionParams, ChatMessage, KnownModel, Model, Zhipu};

    #[tokio::test]
    async fn test_streaming_response() {
        // This test requires ZHIPU_API_KEY to be set
        let api_key = std::env::var("ZHIPU_API_KEY").ok();
        if api_key.is_none() {
            eprintln!("Skipping test: ZHIPU_API_KEY not set");
            return;
        }

        let client = Zhipu::new(api_key).expect("Failed to create client");

        let params = ChatCompletionParams::new_streaming(
            Model::Known(KnownModel::Glm4Flash),
            vec![ChatMessage::user("Count to 3")],
        );

        let stream = client.stream(params).await;
        assert!(stream.is_ok(), "Stream request should succeed");

        let mut stream = stream.unwrap();
        let mut reply = String::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.expect("chunk should decode");
            reply.push_str(chunk.delta_text());
        }
        assert!(!reply.is_empty(), "Expected some streamed text");
    }

    #[tokio::test]
    async fn test_invalid_key_is_an_authentication_error() {
        // Does not need a real key, but still talks to the live endpoint.
        if std::env::var("ZHIPU_API_KEY").is_err() {
            eprintln!("Skipping test: ZHIPU_API_KEY not set (live endpoint test)");
            return;
        }

        let client = Zhipu::new(Some("not-a-real-key".to_string())).expect("client builds");
        let params = ChatCompletionParams::new_streaming(
            Model::Known(KnownModel::Glm4Flash),
            vec![ChatMessage::user("hi")],
        );

        let result = client.stream(params).await;
        assert!(result.is_err(), "Bogus key should be rejected");
    }
}
