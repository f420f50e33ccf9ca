//! Element-at-a-time decoding of a top-level JSON array

use serde::de::{self, DeserializeOwned, SeqAccess, Visitor};
use std::fmt;
use std::io::{BufReader, Read};
use std::marker::PhantomData;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::StreamError;

/// Number of decoded elements buffered between the decoder thread and its consumer
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Decode a top-level JSON array from `reader`, calling `on_element` for each element in order.
///
/// Elements are never collected; only the element currently being decoded is held
/// in memory. If `on_element` returns an error, decoding stops and that error is
/// returned unchanged. Malformed input (including a top-level value that is not an
/// array, or trailing data after it) yields [`StreamError::Decode`]; a failure of
/// the underlying reader yields [`StreamError::Io`].
///
/// Returns the number of elements handed to `on_element`.
pub fn for_each_element<T, R, E, F>(reader: R, mut on_element: F) -> Result<usize, E>
where
    T: DeserializeOwned,
    R: Read,
    E: From<StreamError>,
    F: FnMut(T) -> Result<(), E>,
{
    let mut deserializer = serde_json::Deserializer::from_reader(BufReader::new(reader));
    let mut decoded = 0usize;
    let mut consumer_error: Option<E> = None;

    let visitor = ElementVisitor {
        on_element: &mut on_element,
        decoded: &mut decoded,
        consumer_error: &mut consumer_error,
        marker: PhantomData::<fn() -> T>,
    };
    let result = de::Deserializer::deserialize_seq(&mut deserializer, visitor);

    if let Some(e) = consumer_error {
        return Err(e);
    }
    if let Err(source) = result {
        return Err(StreamError::from_json(decoded, source).into());
    }
    deserializer
        .end()
        .map_err(|source| StreamError::from_json(decoded, source))?;

    Ok(decoded)
}

struct ElementVisitor<'a, T, F, E> {
    on_element: &'a mut F,
    decoded: &'a mut usize,
    consumer_error: &'a mut Option<E>,
    marker: PhantomData<fn() -> T>,
}

impl<'de, T, F, E> Visitor<'de> for ElementVisitor<'_, T, F, E>
where
    T: DeserializeOwned,
    F: FnMut(T) -> Result<(), E>,
{
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a JSON array")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<(), A::Error>
    where
        A: SeqAccess<'de>,
    {
        while let Some(element) = seq.next_element::<T>()? {
            *self.decoded += 1;
            if let Err(e) = (self.on_element)(element) {
                *self.consumer_error = Some(e);
                return Err(de::Error::custom("element consumer stopped"));
            }
        }
        Ok(())
    }
}

/// Elements decoded on a blocking thread, received asynchronously.
///
/// Drain with [`ElementStream::next`], then call [`ElementStream::finish`] to learn
/// whether the array decoded completely. A decode failure ends the stream early
/// and is reported by `finish`.
pub struct ElementStream<T> {
    rx: mpsc::Receiver<T>,
    task: JoinHandle<Result<usize, StreamError>>,
}

impl<T> ElementStream<T> {
    /// Receive the next decoded element, or `None` once the decoder has stopped.
    pub async fn next(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Wait for the decoder thread and return the number of decoded elements.
    ///
    /// Calling this before the stream is drained stops the decoder, which then
    /// reports [`StreamError::Aborted`].
    pub async fn finish(self) -> Result<usize, StreamError> {
        let ElementStream { rx, task } = self;
        drop(rx);
        match task.await {
            Ok(result) => result,
            Err(e) => Err(StreamError::Task(e.to_string())),
        }
    }
}

/// Decode `reader` on the blocking thread pool, delivering elements through a
/// channel holding at most `capacity` elements.
pub fn spawn_decoder<T, R>(reader: R, capacity: usize) -> ElementStream<T>
where
    T: DeserializeOwned + Send + 'static,
    R: Read + Send + 'static,
{
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let task = tokio::task::spawn_blocking(move || {
        for_each_element(reader, |element: T| {
            tx.blocking_send(element).map_err(|_| StreamError::Aborted)
        })
    });
    ElementStream { rx, task }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: u32,
    }

    fn collect(input: &str) -> Result<Vec<Item>, StreamError> {
        let mut items = Vec::new();
        for_each_element(input.as_bytes(), |item: Item| {
            items.push(item);
            Ok::<_, StreamError>(())
        })?;
        Ok(items)
    }

    #[test]
    fn decodes_elements_in_order() {
        let items = collect(r#"[{"id": 1}, {"id": 2}, {"id": 3}]"#).unwrap();
        assert_eq!(items, vec![Item { id: 1 }, Item { id: 2 }, Item { id: 3 }]);
    }

    #[test]
    fn empty_array_yields_nothing() {
        let count = for_each_element(" [ ] \n".as_bytes(), |_: Item| Ok::<_, StreamError>(()))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn decode_error_reports_element_index() {
        let err = collect(r#"[{"id": 1}, {"id": "x"}, {"id": 3}]"#).unwrap_err();
        match err {
            StreamError::Decode { index, .. } => assert_eq!(index, 1),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_non_array_input() {
        assert!(matches!(
            collect(r#"{"id": 1}"#),
            Err(StreamError::Decode { index: 0, .. })
        ));
        assert!(matches!(collect(""), Err(StreamError::Decode { .. })));
    }

    #[test]
    fn rejects_truncated_and_trailing_input() {
        assert!(matches!(
            collect(r#"[{"id": 1}, {"id": 2}"#),
            Err(StreamError::Decode { index: 2, .. })
        ));
        assert!(matches!(
            collect(r#"[{"id": 1}] [1]"#),
            Err(StreamError::Decode { .. })
        ));
    }

    #[derive(Debug, PartialEq)]
    enum ConsumerError {
        Stream(String),
        Full,
    }

    impl From<StreamError> for ConsumerError {
        fn from(e: StreamError) -> Self {
            ConsumerError::Stream(e.to_string())
        }
    }

    #[test]
    fn consumer_error_stops_decoding() {
        let mut seen = 0;
        let err = for_each_element(r#"[{"id": 1}, {"id": 2}, {"id": 3}]"#.as_bytes(), |_: Item| {
            seen += 1;
            if seen == 2 {
                Err(ConsumerError::Full)
            } else {
                Ok(())
            }
        })
        .unwrap_err();
        assert_eq!(err, ConsumerError::Full);
        assert_eq!(seen, 2);
    }

    #[tokio::test]
    async fn spawned_decoder_delivers_all_elements() {
        let input: String = format!(
            "[{}]",
            (0..500)
                .map(|i| format!(r#"{{"id": {i}}}"#))
                .collect::<Vec<_>>()
                .join(",")
        );
        let mut stream = spawn_decoder::<Item, _>(std::io::Cursor::new(input.into_bytes()), 4);

        let mut expected = 0;
        while let Some(item) = stream.next().await {
            assert_eq!(item.id, expected);
            expected += 1;
        }
        assert_eq!(expected, 500);
        assert_eq!(stream.finish().await.unwrap(), 500);
    }

    #[tokio::test]
    async fn spawned_decoder_reports_decode_failure() {
        let mut stream =
            spawn_decoder::<Item, _>(std::io::Cursor::new(br#"[{"id": 1}, nope]"#.to_vec()), 4);
        assert_eq!(stream.next().await, Some(Item { id: 1 }));
        assert_eq!(stream.next().await, None);
        assert!(matches!(
            stream.finish().await,
            Err(StreamError::Decode { index: 1, .. })
        ));
    }

    #[tokio::test]
    async fn finishing_early_aborts_decoder() {
        let input = format!(
            "[{}]",
            (0..100)
                .map(|i| format!(r#"{{"id": {i}}}"#))
                .collect::<Vec<_>>()
                .join(",")
        );
        let mut stream = spawn_decoder::<Item, _>(std::io::Cursor::new(input.into_bytes()), 1);
        assert!(stream.next().await.is_some());
        assert!(matches!(stream.finish().await, Err(StreamError::Aborted)));
    }
}
