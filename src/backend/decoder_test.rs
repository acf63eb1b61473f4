use std::convert::Infallible;
use std::io;

use super::*;

fn frame(content: &str) -> String {
    let data = CompletionResponse {
        choices: Some(vec![CompletionChoiceResponse {
            delta: Some(CompletionDeltaResponse {
                content: Some(content.to_string()),
            }),
        }]),
    };
    format!(
        "data: {}\n",
        serde_json::to_string(&data).expect("failed to serialize")
    )
}

fn decode_all(chunks: &[&[u8]]) -> Vec<String> {
    FrameDecoder::deltas(chunks.iter().copied()).collect()
}

#[test]
fn test_delta_split_inside_json() {
    let deltas = decode_all(&[
        br#"data: {"choices":[{"delta":{"content":"Hel"#.as_slice(),
        b"lo\"}}]}\n".as_slice(),
        b"data: [DONE]\n".as_slice(),
    ]);
    assert_eq!(deltas, vec!["Hello".to_string()]);
}

#[test]
fn test_comment_and_missing_content_produce_nothing() {
    let deltas = decode_all(&[
        b": keepalive\n".as_slice(),
        b"data: {\"choices\":[{\"delta\":{}}]}\n".as_slice(),
    ]);
    assert!(deltas.is_empty());
}

#[test]
fn test_blank_and_foreign_lines_are_ignored() {
    let body = format!(
        "\n   \nevent: message\nid: 7\n{}retry: 1000\n{}",
        frame("a"),
        frame("b")
    );
    let deltas = decode_all(&[body.as_bytes()]);
    assert_eq!(deltas, vec!["a", "b"]);
}

#[test]
fn test_malformed_frame_does_not_stop_stream() {
    let body = format!(
        "{}data: {{not json}}\ndata: [1, 2\n{}data: [DONE]\n",
        frame("before"),
        frame("after")
    );
    let deltas = decode_all(&[body.as_bytes()]);
    assert_eq!(deltas, vec!["before", "after"]);
}

#[test]
fn test_unexpected_shapes_are_skipped() {
    let body = concat!(
        "data: {\"choices\":[]}\n",
        "data: {\"choices\":null}\n",
        "data: {\"choices\":[{\"delta\":null}]}\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"\"}}]}\n",
        "data: {\"choices\":[{\"delta\":{\"content\":null}}]}\n",
        "data: {}\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n",
    );
    let deltas = decode_all(&[body.as_bytes()]);
    assert_eq!(deltas, vec!["ok"]);
}

#[test]
fn test_only_first_choice_is_used() {
    let body = "data: {\"choices\":[{\"delta\":{\"content\":\"first\"}},{\"delta\":{\"content\":\"second\"}}]}\n";
    let deltas = decode_all(&[body.as_bytes()]);
    assert_eq!(deltas, vec!["first"]);
}

#[test]
fn test_crlf_and_payload_whitespace() {
    let body = "data: {\"choices\":[{\"delta\":{\"content\":\"x\"}}]}  \r\ndata:  [DONE] \r\n";
    let mut decoder = FrameDecoder::new();
    let deltas = decoder.feed(body.as_bytes());
    assert_eq!(deltas, vec!["x"]);
    assert!(decoder.is_done());
}

#[test]
fn test_prefix_requires_space() {
    let body = "data:{\"choices\":[{\"delta\":{\"content\":\"x\"}}]}\n";
    assert!(decode_all(&[body.as_bytes()]).is_empty());
}

#[test]
fn test_done_defers_rest_of_chunk() {
    let body = format!("{}data: [DONE]\n{}", frame("kept"), frame("deferred"));
    let mut decoder = FrameDecoder::new();

    let deltas = decoder.feed(body.as_bytes());
    assert_eq!(deltas, vec!["kept"]);
    assert!(decoder.is_done());

    // The lines left after [DONE] are scanned with the next chunk.
    assert_eq!(decoder.feed(frame("late").as_bytes()), vec!["deferred", "late"]);
    assert!(decoder.finish().is_none());
}

#[test]
fn test_data_chunk_after_done_chunk() {
    let late = frame("late");
    let deltas = decode_all(&[b"data: [DONE]\n".as_slice(), late.as_bytes()]);
    assert_eq!(deltas, vec!["late"]);
}

#[test]
fn test_lines_after_done_in_last_chunk_are_discarded() {
    let body = format!("{}data: [DONE]\n{}", frame("kept"), frame("dropped"));
    let deltas = decode_all(&[body.as_bytes()]);
    assert_eq!(deltas, vec!["kept"]);

    let mut decoder = FrameDecoder::new();
    decoder.feed(body.as_bytes());
    assert_eq!(decoder.finish(), Some(frame("dropped")));
    assert!(decoder.feed(frame("after finish").as_bytes()).is_empty());
}

#[test]
fn test_leading_bom_is_stripped() {
    let mut body = vec![0xEF, 0xBB, 0xBF];
    body.extend_from_slice(frame("hi").as_bytes());
    assert_eq!(decode_all(&[body.as_slice()]), vec!["hi"]);

    // Split inside the BOM itself.
    assert_eq!(decode_all(&[&body[..2], &body[2..]]), vec!["hi"]);

    // Only a leading BOM is removed.
    let inner = format!("{}{}{}", frame("a"), '\u{FEFF}', frame("b"));
    assert_eq!(decode_all(&[inner.as_bytes()]), vec!["a"]);
}

#[test]
fn test_unterminated_tail_is_discarded() {
    let body = format!(
        "{}data: {{\"choices\":[{{\"delta\":{{\"content\":\"tail\"}}}}]}}",
        frame("complete")
    );
    let deltas = decode_all(&[body.as_bytes()]);
    assert_eq!(deltas, vec!["complete"]);

    let mut decoder = FrameDecoder::new();
    decoder.feed(body.as_bytes());
    let tail = decoder.finish().expect("tail is kept until finish");
    assert!(tail.contains("tail"));
    assert!(decoder.finish().is_none());
}

#[test]
fn test_every_split_point_yields_same_deltas() {
    let contents = ["Hi ", "thére, ", "I'm here 💛", " for you."];
    let mut body = String::from(": keepalive\r\n\r\n");
    for content in contents {
        body.push_str(&frame(content));
        body.push_str("\n");
    }
    body.push_str("data: [DONE]\n");
    let bytes = body.as_bytes();

    for split in 0..=bytes.len() {
        let (head, tail) = bytes.split_at(split);
        let deltas = decode_all(&[head, tail]);
        assert_eq!(deltas, contents, "split at byte {}", split);
    }
}

#[test]
fn test_byte_by_byte_chunks() {
    let contents = ["你好", "🌱 grow", "ça va"];
    let mut body = String::new();
    for content in contents {
        body.push_str(&frame(content));
    }
    body.push_str("data: [DONE]\n");

    let chunks = body.as_bytes().chunks(1).collect::<Vec<_>>();
    let deltas = FrameDecoder::deltas(chunks).collect::<Vec<_>>();
    assert_eq!(deltas, contents);

    let concatenated: String = deltas.concat();
    assert_eq!(concatenated, contents.concat());
}

#[test]
fn test_multibyte_character_split_across_chunks() {
    let body = frame("💛");
    let bytes = body.as_bytes();
    let heart = bytes
        .windows(4)
        .position(|w| w == "💛".as_bytes())
        .expect("heart is encoded");

    let mut decoder = FrameDecoder::new();
    assert!(decoder.feed(&bytes[..heart + 1]).is_empty());
    assert!(decoder.feed(&bytes[heart + 1..heart + 3]).is_empty());
    assert_eq!(decoder.feed(&bytes[heart + 3..]), vec!["💛"]);
}

#[test]
fn test_invalid_utf8_is_replaced() {
    let mut body = b"data: {\"choices\":[{\"delta\":{\"content\":\"a".to_vec();
    body.push(0xff);
    body.extend_from_slice(b"b\"}}]}\n");

    let deltas = decode_all(&[body.as_slice()]);
    assert_eq!(deltas, vec!["a\u{FFFD}b"]);
}

#[tokio::test]
async fn test_decode_stream() {
    let body = format!("{}{}data: [DONE]\n", frame("Hello "), frame("there!"));
    let bytes = body.into_bytes();
    let chunks = bytes
        .chunks(7)
        .map(|c| Ok::<_, Infallible>(c.to_vec()))
        .collect::<Vec<_>>();

    let deltas = decode_stream(futures::stream::iter(chunks), None)
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .collect::<Result<Vec<_>>>()
        .expect("stream failed");
    assert_eq!(deltas, vec!["Hello ", "there!"]);
}

#[tokio::test]
async fn test_decode_stream_reads_until_body_ends() {
    let chunks = vec![
        Ok::<_, Infallible>(format!("{}data: [DONE]\n", frame("one")).into_bytes()),
        Ok(frame("two").into_bytes()),
    ];

    let deltas = decode_stream(futures::stream::iter(chunks), None)
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .collect::<Result<Vec<_>>>()
        .expect("stream failed");
    assert_eq!(deltas, vec!["one", "two"]);
}

#[tokio::test]
async fn test_decode_stream_read_error() {
    let chunks = vec![
        Ok(frame("partial").into_bytes()),
        Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset")),
        Ok(frame("never").into_bytes()),
    ];

    let mut stream = decode_stream(futures::stream::iter(chunks), None);
    assert_eq!(stream.next().await.unwrap().unwrap(), "partial");

    let err = stream.next().await.unwrap().unwrap_err();
    assert_eq!(err.to_string(), "reading response body");
    assert_eq!(err.root_cause().to_string(), "connection reset");

    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn test_decode_stream_idle_timeout() {
    let first = futures::stream::iter(vec![Ok::<_, Infallible>(frame("one").into_bytes())]);
    let body = first.chain(futures::stream::pending());

    let mut stream = decode_stream(body, Some(Duration::from_millis(50)));
    assert_eq!(stream.next().await.unwrap().unwrap(), "one");

    let err = stream.next().await.unwrap().unwrap_err();
    let err = err
        .downcast_ref::<BackendError>()
        .expect("idle timeout is a backend error");
    assert!(matches!(err, BackendError::IdleTimeout(d) if *d == Duration::from_millis(50)));

    assert!(stream.next().await.is_none());
}
