//! Colour-tagged console logging. Every line carries the UTC wall-clock time.
//!
//! `info!` and `log!` go to stdout, `warn!` and `error!` to stderr. `event!` is verbose
//! tracing and only printed when `LOG_CONTRAIL_EVENTS` is set.

#[doc(hidden)]
#[macro_export]
macro_rules! __log_line {
    ($sink:ident, $colour:literal, $tag:literal, $($arg:tt)*) => {
        $sink!(
            concat!("\x1b[", $colour, "m", $tag, "[{}]\x1b[0m {}"),
            chrono::Utc::now().format("%H:%M:%S"),
            format!($($arg)*)
        )
    };
}

#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => { $crate::__log_line!(println, "32", "[INFO] ", $($arg)*) };
}

#[macro_export]
macro_rules! log {
    ($($arg:tt)*) => { $crate::__log_line!(println, "33", "[LOG]  ", $($arg)*) };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => { $crate::__log_line!(eprintln, "35", "[WARN] ", $($arg)*) };
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => { $crate::__log_line!(eprintln, "31", "[ERROR]", $($arg)*) };
}

/// Stage transitions and per-row grid progress.
#[macro_export]
macro_rules! event {
    ($($arg:tt)*) => {
        if std::env::var("LOG_CONTRAIL_EVENTS").is_ok() {
            $crate::__log_line!(println, "36", "[EVENT]", $($arg)*)
        }
    };
}
