//! Registry for composing interceptor chains.

use crate::Interceptor;
use crate::noop::NoopInterceptor;

/// Builder that stacks interceptors on top of a terminal one.
///
/// Each call to [`with`](Registry::with) wraps the current chain in a new
/// outer layer; [`build`](Registry::build) hands back the outermost layer.
pub struct Registry<P> {
    inner: P,
}

impl Registry<NoopInterceptor> {
    /// Start a chain terminated by a [`NoopInterceptor`].
    pub fn new() -> Self {
        Registry {
            inner: NoopInterceptor::new(),
        }
    }
}

impl Default for Registry<NoopInterceptor> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Interceptor> Registry<P> {
    /// Start a chain terminated by a custom interceptor.
    pub fn from(inner: P) -> Self {
        Registry { inner }
    }

    /// Wrap the chain with another layer.
    pub fn with<O, F>(self, f: F) -> Registry<O>
    where
        F: FnOnce(P) -> O,
        O: Interceptor,
    {
        Registry {
            inner: f(self.inner),
        }
    }

    /// Finish building and return the outermost interceptor.
    pub fn build(self) -> P {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream_info::StreamInfo;
    use crate::{MediaPacket, Packet, TaggedPacket};
    use sansio::Protocol;
    use shared::error::Error;
    use std::time::Instant;

    fn media() -> TaggedPacket {
        TaggedPacket {
            now: Instant::now(),
            transport: Default::default(),
            message: Packet::Rtp(MediaPacket {
                ssrc: 7,
                sequence_number: 1,
                ..Default::default()
            }),
        }
    }

    struct NamedInterceptor<P> {
        inner: P,
        name: &'static str,
    }

    impl<P> NamedInterceptor<P> {
        fn with_name(name: &'static str) -> impl FnOnce(P) -> Self {
            move |inner| Self { inner, name }
        }
    }

    impl<P: Interceptor> Protocol<TaggedPacket, TaggedPacket, ()> for NamedInterceptor<P> {
        type Rout = TaggedPacket;
        type Wout = TaggedPacket;
        type Eout = ();
        type Error = Error;
        type Time = Instant;

        fn handle_read(&mut self, msg: TaggedPacket) -> Result<(), Self::Error> {
            self.inner.handle_read(msg)
        }

        fn poll_read(&mut self) -> Option<Self::Rout> {
            self.inner.poll_read()
        }

        fn handle_write(&mut self, msg: TaggedPacket) -> Result<(), Self::Error> {
            self.inner.handle_write(msg)
        }

        fn poll_write(&mut self) -> Option<Self::Wout> {
            self.inner.poll_write()
        }
    }

    impl<P: Interceptor> Interceptor for NamedInterceptor<P> {
        fn bind_local_stream(&mut self, info: &StreamInfo) {
            self.inner.bind_local_stream(info);
        }
        fn unbind_local_stream(&mut self, info: &StreamInfo) {
            self.inner.unbind_local_stream(info);
        }
        fn bind_remote_stream(&mut self, info: &StreamInfo) {
            self.inner.bind_remote_stream(info);
        }
        fn unbind_remote_stream(&mut self, info: &StreamInfo) {
            self.inner.unbind_remote_stream(info);
        }
    }

    #[test]
    fn test_registry_new() {
        let mut chain = Registry::new().build();
        let pkt = media();
        chain.handle_read(pkt.clone()).unwrap();
        assert_eq!(chain.poll_read(), Some(pkt));
    }

    #[test]
    fn test_registry_with_multiple_interceptors() {
        let mut chain = Registry::new()
            .with(NamedInterceptor::with_name("inner"))
            .with(NamedInterceptor::with_name("outer"))
            .build();

        let pkt = media();
        chain.handle_write(pkt.clone()).unwrap();
        assert_eq!(chain.poll_write(), Some(pkt));
        assert_eq!(chain.name, "outer");
        assert_eq!(chain.inner.name, "inner");
    }

    #[test]
    fn test_registry_from_inner() {
        let mut chain = Registry::from(NoopInterceptor::new())
            .with(NamedInterceptor::with_name("only"))
            .build();

        let pkt = media();
        chain.handle_read(pkt.clone()).unwrap();
        assert_eq!(chain.poll_read(), Some(pkt));
    }
}
