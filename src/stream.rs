use std::sync::Arc;

use crate::error::StreamMismatch;

#[derive(Debug)]
struct StreamInner {
    label: String,
}

/// Identity token for an ordered execution queue. Operations issued on the
/// same stream execute in enqueue order relative to each other; ordering
/// across distinct streams is not guaranteed.
///
/// Cheap to clone; clones compare equal to their source via [`is_same`].
///
/// [`is_same`]: Stream::is_same
#[derive(Debug, Clone)]
pub struct Stream {
    inner: Arc<StreamInner>,
}

impl Stream {
    pub(crate) fn new(label: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(StreamInner {
                label: label.into(),
            }),
        }
    }

    pub fn label(&self) -> &str {
        &self.inner.label
    }

    pub fn is_same(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Where an operation's device work is enqueued. Threaded explicitly through
/// every transfer and kernel dispatch.
#[derive(Debug, Clone, Default)]
pub enum ExecutionContext {
    /// The device's default queue.
    #[default]
    Default,

    /// A caller-created [`Stream`].
    Stream(Stream),
}

impl ExecutionContext {
    pub fn stream(&self) -> Option<&Stream> {
        match self {
            Self::Default => None,
            Self::Stream(stream) => Some(stream),
        }
    }

    /// Merge the contexts of two operands.
    ///
    /// A default context yields to the other side; identical streams pass
    /// through. Two distinct streams are a precondition failure, not an
    /// implicit synchronization point.
    pub fn join(&self, other: &Self) -> Result<ExecutionContext, StreamMismatch> {
        match (self, other) {
            (Self::Default, other) => Ok(other.clone()),
            (this, Self::Default) => Ok(this.clone()),
            (Self::Stream(first), Self::Stream(second)) => {
                if first.is_same(second) {
                    Ok(self.clone())
                }
                else {
                    Err(StreamMismatch {
                        first: first.clone(),
                        second: second.clone(),
                    })
                }
            }
        }
    }
}

impl From<Stream> for ExecutionContext {
    fn from(stream: Stream) -> Self {
        Self::Stream(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(label: &str) -> Stream {
        Stream::new(label)
    }

    #[test]
    fn default_context_yields_to_stream() {
        let s = stream("a");
        let joined = ExecutionContext::Default
            .join(&ExecutionContext::Stream(s.clone()))
            .unwrap();
        assert!(joined.stream().unwrap().is_same(&s));

        let joined = ExecutionContext::Stream(s.clone())
            .join(&ExecutionContext::Default)
            .unwrap();
        assert!(joined.stream().unwrap().is_same(&s));
    }

    #[test]
    fn identical_streams_join() {
        let s = stream("a");
        let joined = ExecutionContext::Stream(s.clone())
            .join(&ExecutionContext::Stream(s.clone()))
            .unwrap();
        assert!(joined.stream().unwrap().is_same(&s));
    }

    #[test]
    fn distinct_streams_are_rejected() {
        let result =
            ExecutionContext::Stream(stream("a")).join(&ExecutionContext::Stream(stream("b")));
        assert!(result.is_err());
    }

    #[test]
    fn clone_is_same_stream() {
        let s = stream("a");
        assert!(s.clone().is_same(&s));
        assert!(!s.is_same(&stream("a")));
    }
}
