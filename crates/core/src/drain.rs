use crate::transport::{Body, ReadOutcome, TransportError};

/// Size of each read issued against a response body.
pub const CHUNK_SIZE: usize = 1024;

/// Reads `body` until it reports exhaustion and returns every byte read.
///
/// A body may end either with a zero-length [`ReadOutcome::Filled`] or with a
/// [`ReadOutcome::Finished`] carrying the last bytes; both yield the same
/// buffer. Only bytes a read actually reported are kept. The body is dropped
/// before returning, whether the drain succeeded or not.
pub async fn drain<B>(mut body: B) -> Result<Vec<u8>, TransportError>
where
    B: Body,
{
    let mut chunk = [0u8; CHUNK_SIZE];
    let mut out = Vec::new();

    loop {
        let (n, finished) = match body.read(&mut chunk).await? {
            ReadOutcome::Filled(n) => (n, n == 0),
            ReadOutcome::Finished(n) => (n, true),
        };
        if n > chunk.len() {
            return Err(TransportError::body(format!(
                "body reported {n} bytes for a {} byte read",
                chunk.len()
            )));
        }
        out.extend_from_slice(&chunk[..n]);
        if finished {
            break;
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::BufferedBody;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::io;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    /// Replays scripted read results and records when it is dropped.
    struct ScriptedBody {
        reads: VecDeque<Result<Vec<u8>, io::ErrorKind>>,
        end_on_last: bool,
        released: Arc<AtomicBool>,
    }

    impl ScriptedBody {
        fn new(chunks: &[&[u8]], end_on_last: bool) -> (Self, Arc<AtomicBool>) {
            let released = Arc::new(AtomicBool::new(false));
            let body = Self {
                reads: chunks.iter().map(|c| Ok(c.to_vec())).collect(),
                end_on_last,
                released: Arc::clone(&released),
            };
            (body, released)
        }
    }

    impl Drop for ScriptedBody {
        fn drop(&mut self) {
            self.released.store(true, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl Body for ScriptedBody {
        async fn read(&mut self, buf: &mut [u8]) -> Result<ReadOutcome, TransportError> {
            match self.reads.pop_front() {
                Some(Ok(data)) => {
                    buf[..data.len()].copy_from_slice(&data);
                    if self.end_on_last && self.reads.is_empty() {
                        Ok(ReadOutcome::Finished(data.len()))
                    } else {
                        Ok(ReadOutcome::Filled(data.len()))
                    }
                }
                Some(Err(kind)) => Err(TransportError::body(io::Error::from(kind))),
                None => Ok(ReadOutcome::Filled(0)),
            }
        }
    }

    #[tokio::test]
    async fn both_end_styles_produce_identical_buffers() {
        let chunks: [&[u8]; 3] = [b"[{\"word\":", b"\"mmiri\"", b"}]"];
        let (zero_read, _) = ScriptedBody::new(&chunks, false);
        let (end_signal, _) = ScriptedBody::new(&chunks, true);

        let a = drain(zero_read).await.expect("drain zero-length style");
        let b = drain(end_signal).await.expect("drain end-signal style");
        assert_eq!(a, b);
        assert_eq!(a, br#"[{"word":"mmiri"}]"#.to_vec());
    }

    #[tokio::test]
    async fn buffered_bodies_agree_across_chunk_boundaries() {
        let payload: Vec<u8> = (0..(CHUNK_SIZE * 3 + 17)).map(|i| b'a' + (i % 26) as u8).collect();
        let a = drain(BufferedBody::new(payload.clone())).await.expect("drain");
        let b = drain(BufferedBody::with_end_signal(payload.clone()))
            .await
            .expect("drain");
        assert_eq!(a, payload);
        assert_eq!(b, payload);
    }

    #[tokio::test]
    async fn no_padding_survives_a_short_final_read() {
        let out = drain(BufferedBody::new("[]")).await.expect("drain");
        assert_eq!(out, b"[]".to_vec());
        assert!(!out.contains(&0));
    }

    #[tokio::test]
    async fn empty_body_drains_to_nothing() {
        assert!(drain(BufferedBody::new(Vec::new())).await.expect("drain").is_empty());
        assert!(drain(BufferedBody::with_end_signal(Vec::new()))
            .await
            .expect("drain")
            .is_empty());
    }

    #[tokio::test]
    async fn read_error_aborts_and_releases_body() {
        let released = Arc::new(AtomicBool::new(false));
        let body = ScriptedBody {
            reads: VecDeque::from([Ok(b"[{".to_vec()), Err(io::ErrorKind::ConnectionReset)]),
            end_on_last: false,
            released: Arc::clone(&released),
        };

        let err = drain(body).await.expect_err("read error must abort");
        assert!(matches!(err, TransportError::Body(_)));
        assert!(released.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn body_is_released_after_success() {
        let (body, released) = ScriptedBody::new(&[b"[]".as_slice()], true);
        drain(body).await.expect("drain");
        assert!(released.load(Ordering::SeqCst));
    }

    struct OverreportingBody;

    #[async_trait]
    impl Body for OverreportingBody {
        async fn read(&mut self, buf: &mut [u8]) -> Result<ReadOutcome, TransportError> {
            Ok(ReadOutcome::Filled(buf.len() + 1))
        }
    }

    #[tokio::test]
    async fn overreported_read_length_is_an_error() {
        let err = drain(OverreportingBody).await.expect_err("must fail");
        assert!(err.to_string().contains("byte read"));
    }
}
