//! Process-wide panic reporting
//!
//! One panic hook per process, however many consoles exist. It chains to
//! the hook that was installed before it and then fans the panic out to
//! every live capture handle.

use std::backtrace::Backtrace;
use std::sync::{Arc, Mutex, Once, PoisonError, Weak};

use super::{CaptureHandle, Shared};

static HOOK: Once = Once::new();
static SINKS: Mutex<Vec<Weak<Shared>>> = Mutex::new(Vec::new());

/// Register `handle` to receive panics, installing the hook on first use
///
/// Registering the same handle twice is a no-op.
pub fn install_panic_hook(handle: &CaptureHandle) {
    {
        let mut sinks = SINKS.lock().unwrap_or_else(PoisonError::into_inner);
        sinks.retain(|sink| sink.strong_count() > 0);
        let known = sinks
            .iter()
            .filter_map(Weak::upgrade)
            .any(|shared| handle.same_as(&shared));
        if !known {
            sinks.push(Arc::downgrade(&handle.shared));
        }
    }

    HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            previous(info);

            let payload = info
                .payload()
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| info.payload().downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "Box<dyn Any>".to_string());
            let message = match info.location() {
                Some(loc) => format!("panicked at {}:{}: {}", loc.file(), loc.line(), payload),
                None => format!("panicked: {}", payload),
            };
            let stack = Backtrace::force_capture().to_string();

            let live: Vec<Arc<Shared>> = SINKS
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .iter()
                .filter_map(Weak::upgrade)
                .collect();
            for shared in live {
                CaptureHandle { shared }.report_error(message.clone(), Some(stack.clone()));
            }
        }));
        tracing::debug!("console panic hook installed");
    });
}
