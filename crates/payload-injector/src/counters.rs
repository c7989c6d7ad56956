use std::sync::atomic::{AtomicU64, Ordering};

/// Per-engine injection counters
#[derive(Debug, Default)]
pub struct InjectionCounters {
    pub(crate) http_injects:        AtomicU64,
    pub(crate) http2_injects:       AtomicU64,
    pub(crate) http2_translate_err: AtomicU64,
    pub(crate) http2_mid_frame:     AtomicU64,
}

/// Point-in-time copy of [`InjectionCounters`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// Pages sent unchanged on HTTP/1 flows
    pub http_injects:        u64,
    /// Pages translated and sent on HTTP/2 flows
    pub http2_injects:       u64,
    /// HTTP/2 injections refused because the page could not be translated
    pub http2_translate_err: u64,
    /// HTTP/2 injections refused because the server side was mid-frame
    pub http2_mid_frame:     u64,
}

impl InjectionCounters {
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            http_injects:        self.http_injects.load(Ordering::Relaxed),
            http2_injects:       self.http2_injects.load(Ordering::Relaxed),
            http2_translate_err: self.http2_translate_err.load(Ordering::Relaxed),
            http2_mid_frame:     self.http2_mid_frame.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}
