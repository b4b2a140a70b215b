use log::{debug, info};
use std::error::Error;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Callback run once per timer period, in the timer's own context.
pub type PulseCallback = Arc<dyn Fn() + Send + Sync + 'static>;

#[derive(Debug)]
pub enum TimerError {
    /// The timer could not be set up
    Init(String),
    /// The requested rate cannot be programmed
    InvalidFrequency(f64),
    /// `start` or `set_frequency` before `init`
    NotInitialized,
}

impl fmt::Display for TimerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerError::Init(msg) => write!(f, "timer initialization failed: {}", msg),
            TimerError::InvalidFrequency(hz) => write!(f, "invalid timer frequency: {} Hz", hz),
            TimerError::NotInitialized => write!(f, "timer used before initialization"),
        }
    }
}

impl Error for TimerError {}

/// Periodic interrupt source.
///
/// `set_frequency` must be atomic with respect to the callback: a pulse in
/// flight completes at the old rate and the next one is scheduled at the new
/// rate, with no gap and no extra pulse.
pub trait Timer {
    fn init(&mut self, callback: PulseCallback) -> Result<(), TimerError>;
    fn start(&mut self, frequency_hz: f64) -> Result<(), TimerError>;
    fn set_frequency(&mut self, frequency_hz: f64) -> Result<(), TimerError>;
    fn stop(&mut self);
}

fn period_nanos(frequency_hz: f64) -> Result<u64, TimerError> {
    if !frequency_hz.is_finite() || frequency_hz < 0.0 {
        return Err(TimerError::InvalidFrequency(frequency_hz));
    }
    if frequency_hz == 0.0 {
        // Zero means hold: the thread keeps waiting and emits nothing.
        return Ok(0);
    }
    Ok((1_000_000_000.0 / frequency_hz).round().max(1.0) as u64)
}

// Longest single sleep, so stop and start are noticed promptly at slow rates.
const MAX_SLEEP: Duration = Duration::from_millis(2);

#[derive(Default)]
struct TimerShared {
    enabled: AtomicBool,
    period_nanos: AtomicU64,
    generation: AtomicU64,
    shutdown: AtomicBool,
    // Held by the timer thread for the whole callback; `stop` takes it to
    // wait out a pulse in flight.
    pulse_lock: Mutex<()>,
}

impl TimerShared {
    fn lock_pulse(&self) -> MutexGuard<'_, ()> {
        self.pulse_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Timer backed by a dedicated thread, the host stand-in for a hardware
/// timer interrupt.
#[derive(Default)]
pub struct ThreadTimer {
    shared: Arc<TimerShared>,
    handle: Option<JoinHandle<()>>,
}

impl ThreadTimer {
    pub fn new() -> Self {
        Self::default()
    }
}

fn run_timer_thread(shared: Arc<TimerShared>, callback: PulseCallback) {
    let mut seen_generation = u64::MAX;
    let mut seen_period = 0;
    let mut deadline: Option<Instant> = None;
    let mut last_due: Option<Instant> = None;

    while !shared.shutdown.load(Ordering::Acquire) {
        if !shared.enabled.load(Ordering::Acquire) {
            deadline = None;
            last_due = None;
            thread::sleep(MAX_SLEEP);
            continue;
        }

        let period_nanos = shared.period_nanos.load(Ordering::Acquire);
        if period_nanos == 0 {
            deadline = None;
            last_due = None;
            thread::sleep(MAX_SLEEP);
            continue;
        }
        let period = Duration::from_nanos(period_nanos);

        let generation = shared.generation.load(Ordering::Acquire);
        if generation != seen_generation {
            seen_generation = generation;
            seen_period = period_nanos;
            deadline = None;
            last_due = None;
        } else if period_nanos != seen_period {
            // Retuned: the pending pulse moves to one new period after the last one.
            seen_period = period_nanos;
            deadline = last_due.map(|due| due + period);
        }

        let now = Instant::now();
        let due = *deadline.get_or_insert(now + period);
        if now < due {
            thread::sleep((due - now).min(MAX_SLEEP));
            continue;
        }

        {
            let _pulse = shared.lock_pulse();
            // A stop that landed while we slept must not let one more pulse out.
            if !shared.enabled.load(Ordering::Acquire)
                || shared.generation.load(Ordering::Acquire) != seen_generation
            {
                continue;
            }
            callback();
        }

        last_due = Some(due);
        let next = due + period;
        deadline = Some(if next < now { now + period } else { next });
    }
}

impl Timer for ThreadTimer {
    fn init(&mut self, callback: PulseCallback) -> Result<(), TimerError> {
        if self.handle.is_some() {
            return Ok(());
        }

        let shared = Arc::clone(&self.shared);
        let handle = thread::Builder::new()
            .name("beatclock-timer".to_string())
            .spawn(move || run_timer_thread(shared, callback))
            .map_err(|e| TimerError::Init(e.to_string()))?;

        info!("Timer thread started");
        self.handle = Some(handle);
        Ok(())
    }

    fn start(&mut self, frequency_hz: f64) -> Result<(), TimerError> {
        if self.handle.is_none() {
            return Err(TimerError::NotInitialized);
        }
        let period = period_nanos(frequency_hz)?;
        self.shared.period_nanos.store(period, Ordering::Release);
        self.shared.generation.fetch_add(1, Ordering::AcqRel);
        self.shared.enabled.store(true, Ordering::Release);
        debug!("Timer started at {:.3} Hz", frequency_hz);
        Ok(())
    }

    fn set_frequency(&mut self, frequency_hz: f64) -> Result<(), TimerError> {
        if self.handle.is_none() {
            return Err(TimerError::NotInitialized);
        }
        let period = period_nanos(frequency_hz)?;
        self.shared.period_nanos.store(period, Ordering::Release);
        debug!("Timer retuned to {:.3} Hz", frequency_hz);
        Ok(())
    }

    /// Returns once no pulse is in flight, so nothing fires after `stop`.
    fn stop(&mut self) {
        self.shared.enabled.store(false, Ordering::Release);
        self.shared.generation.fetch_add(1, Ordering::AcqRel);
        drop(self.shared.lock_pulse());
        debug!("Timer stopped");
    }
}

impl Drop for ThreadTimer {
    fn drop(&mut self) {
        self.shared.shutdown.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[derive(Default)]
struct ManualState {
    callback: Option<PulseCallback>,
    running: bool,
    frequency_hz: f64,
    fail_init: bool,
}

/// Timer fired by hand. Clones share state, so a test keeps one handle to
/// fire pulses while the clock engine owns another.
#[derive(Clone, Default)]
pub struct ManualTimer {
    state: Arc<Mutex<ManualState>>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A timer whose `init` fails, as a missing hardware timer would.
    pub fn failing() -> Self {
        let timer = Self::new();
        if let Ok(mut state) = timer.state.lock() {
            state.fail_init = true;
        }
        timer
    }

    /// Runs the callback once if the timer is started. Returns whether it fired.
    pub fn fire(&self) -> bool {
        let callback = match self.state.lock() {
            Ok(state) if state.running => state.callback.clone(),
            _ => None,
        };
        match callback {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }

    pub fn fire_n(&self, pulses: usize) -> usize {
        (0..pulses).filter(|_| self.fire()).count()
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().map(|s| s.running).unwrap_or(false)
    }

    pub fn frequency_hz(&self) -> f64 {
        self.state.lock().map(|s| s.frequency_hz).unwrap_or(0.0)
    }
}

impl Timer for ManualTimer {
    fn init(&mut self, callback: PulseCallback) -> Result<(), TimerError> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| TimerError::Init(e.to_string()))?;
        if state.fail_init {
            return Err(TimerError::Init("no timer available".to_string()));
        }
        state.callback = Some(callback);
        Ok(())
    }

    fn start(&mut self, frequency_hz: f64) -> Result<(), TimerError> {
        period_nanos(frequency_hz)?;
        let mut state = self
            .state
            .lock()
            .map_err(|e| TimerError::Init(e.to_string()))?;
        if state.callback.is_none() {
            return Err(TimerError::NotInitialized);
        }
        state.frequency_hz = frequency_hz;
        state.running = true;
        Ok(())
    }

    fn set_frequency(&mut self, frequency_hz: f64) -> Result<(), TimerError> {
        period_nanos(frequency_hz)?;
        let mut state = self
            .state
            .lock()
            .map_err(|e| TimerError::Init(e.to_string()))?;
        state.frequency_hz = frequency_hz;
        Ok(())
    }

    fn stop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.running = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_period_from_frequency() {
        assert_eq!(period_nanos(48.0).unwrap(), 20_833_333);
        assert_eq!(period_nanos(0.0).unwrap(), 0);
        assert!(period_nanos(-1.0).is_err());
        assert!(period_nanos(f64::NAN).is_err());
    }

    #[test]
    fn test_thread_timer_fires_while_started() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let mut timer = ThreadTimer::new();
        timer
            .init(Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();

        timer.start(500.0).unwrap();
        thread::sleep(Duration::from_millis(100));
        timer.stop();
        let fired = count.load(Ordering::SeqCst);
        assert!(fired > 10, "expected pulses while started, got {}", fired);

        thread::sleep(Duration::from_millis(20));
        let after_stop = count.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(50));
        assert_eq!(count.load(Ordering::SeqCst), after_stop);
    }

    #[test]
    fn test_thread_timer_requires_init() {
        let mut timer = ThreadTimer::new();
        assert!(matches!(
            timer.start(10.0),
            Err(TimerError::NotInitialized)
        ));
    }

    #[test]
    fn test_manual_timer_only_fires_when_running() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let mut timer = ManualTimer::new();
        timer
            .init(Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();

        assert!(!timer.fire());
        timer.start(40.0).unwrap();
        assert_eq!(timer.fire_n(3), 3);
        timer.stop();
        assert!(!timer.fire());
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }
}
