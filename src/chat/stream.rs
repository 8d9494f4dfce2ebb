//! Assembly of streamed completion fragments into a finished reply.

use futures::{Stream, StreamExt, pin_mut};

use crate::chat::render::{CURSOR, Renderer};
use crate::error::Result;
use crate::types::ChatCompletionChunk;

/// Drives a fragment stream to completion, accumulating the reply text.
///
/// After every fragment the renderer is shown the whole buffer with a
/// trailing cursor marker; fragments without a text delta leave the buffer
/// untouched but still trigger a render. When the stream is exhausted the
/// buffer is rendered once without the cursor and returned.
///
/// # Errors
///
/// The first `Err` item ends assembly immediately and is returned; no
/// final render happens and the partial buffer is abandoned with it.
pub async fn assemble<S>(stream: S, renderer: &mut dyn Renderer) -> Result<String>
where
    S: Stream<Item = Result<ChatCompletionChunk>>,
{
    pin_mut!(stream);
    let mut buffer = String::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        buffer.push_str(chunk.delta_text());
        renderer.render_partial(&format!("{buffer}{CURSOR}"));
    }
    renderer.render_final(&buffer);
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use futures::stream;

    use super::*;
    use crate::chat::render::RecordingRenderer;
    use crate::error::Error;

    fn chunks(texts: &[&str]) -> Vec<Result<ChatCompletionChunk>> {
        texts
            .iter()
            .map(|text| Ok(ChatCompletionChunk::from_text(*text)))
            .collect()
    }

    #[tokio::test]
    async fn accumulates_fragments_in_order() {
        let mut renderer = RecordingRenderer::default();
        let text = assemble(stream::iter(chunks(&["Hel", "lo", ", world"])), &mut renderer)
            .await
            .unwrap();

        assert_eq!(text, "Hello, world");
        assert_eq!(renderer.partials, vec!["Hel▌", "Hello▌", "Hello, world▌"]);
        assert_eq!(renderer.finals, vec!["Hello, world"]);
    }

    #[tokio::test]
    async fn empty_stream_yields_empty_reply() {
        let mut renderer = RecordingRenderer::default();
        let text = assemble(stream::iter(chunks(&[])), &mut renderer)
            .await
            .unwrap();

        assert_eq!(text, "");
        assert!(renderer.partials.is_empty());
        assert_eq!(renderer.finals, vec![""]);
    }

    #[tokio::test]
    async fn absent_deltas_never_alter_the_buffer() {
        let empty = ChatCompletionChunk::default();
        let items: Vec<Result<ChatCompletionChunk>> = vec![
            Ok(ChatCompletionChunk::from_text("a")),
            Ok(empty.clone()),
            Ok(ChatCompletionChunk::from_text("b")),
            Ok(empty),
        ];
        let mut renderer = RecordingRenderer::default();
        let text = assemble(stream::iter(items), &mut renderer).await.unwrap();

        assert_eq!(text, "ab");
        assert_eq!(renderer.partials, vec!["a▌", "a▌", "ab▌", "ab▌"]);
    }

    #[tokio::test]
    async fn error_mid_stream_propagates_without_final_render() {
        let items: Vec<Result<ChatCompletionChunk>> = vec![
            Ok(ChatCompletionChunk::from_text("par")),
            Ok(ChatCompletionChunk::from_text("tial")),
            Err(Error::streaming("connection reset", None)),
        ];
        let mut renderer = RecordingRenderer::default();
        let err = assemble(stream::iter(items), &mut renderer)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Streaming { .. }));
        assert_eq!(renderer.partials, vec!["par▌", "partial▌"]);
        assert!(renderer.finals.is_empty());
    }
}
