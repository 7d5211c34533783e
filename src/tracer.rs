use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
  EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use std::path::Path;

#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        tracing::info!($($arg)*)
    };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        tracing::warn!($($arg)*)
    };
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        tracing::error!($($arg)*)
    };
}

#[macro_export]
macro_rules! bail {
  ($msg:expr) => {
    return Err(anyhow::anyhow!("{} {}:{}", $msg,
      std::path::Path::new(file!())
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("unknown"),
      line!()
    ))
  };
  ($fmt:expr, $($arg:tt)*) => {
    return Err(anyhow::anyhow!("{} {}:{}",
      format!($fmt, $($arg)*),
      std::path::Path::new(file!())
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("unknown"),
      line!()
    ))
  };
}

fn caller_file_name(location: &std::panic::Location<'_>) -> String {
  Path::new(location.file())
    .file_name()
    .and_then(|name| name.to_str())
    .unwrap_or("unknown")
    .to_string()
}

/// Attaches "msg file:line" context to a failure and logs it where it happened.
pub trait ContextExt<T> {
  fn cwl(self, msg: &str) -> anyhow::Result<T>;
}

impl<T, E> ContextExt<T> for Result<T, E>
where
  E: Into<anyhow::Error>,
{
  #[track_caller]
  fn cwl(self, msg: &str) -> anyhow::Result<T> {
    let location = std::panic::Location::caller();

    match self {
      Ok(value) => Ok(value),
      Err(e) => {
        let error_info =
          format!("{} {}:{}", msg, caller_file_name(location), location.line());
        let anyhow_error = e.into();
        tracing::error!("{} - underlying error: {}", error_info, anyhow_error);
        Err(anyhow_error.context(error_info))
      }
    }
  }
}

impl<T> ContextExt<T> for Option<T> {
  #[track_caller]
  fn cwl(self, msg: &str) -> anyhow::Result<T> {
    let location = std::panic::Location::caller();

    match self {
      Some(value) => Ok(value),
      None => {
        let error_info =
          format!("{} {}:{}", msg, caller_file_name(location), location.line());
        tracing::error!("cwl error: {}", error_info);
        Err(anyhow::anyhow!(error_info))
      }
    }
  }
}

/// Joins an error and all of its sources, outermost first.
pub fn format_error_chain(error: &anyhow::Error) -> String {
  error
    .chain()
    .map(|err| err.to_string())
    .collect::<Vec<_>>()
    .join("\n↳ ")
}

/// Outermost message and root cause, without `file.rs:line` markers.
/// The full chain belongs in the log, this is what callers get to see.
pub fn public_error_message(error: &anyhow::Error) -> String {
  let outer = error.to_string();
  let outer = strip_location(&outer);
  let root = error.root_cause().to_string();
  let root = strip_location(&root);

  if outer == root {
    outer.to_string()
  } else {
    format!("{outer}: {root}")
  }
}

/// Drops a trailing ` name.rs:123` added by `cwl` and `bail!`.
fn strip_location(msg: &str) -> &str {
  if let Some((head, tail)) = msg.rsplit_once(' ')
    && let Some((file, line)) = tail.split_once(".rs:")
    && !file.is_empty()
    && !line.is_empty()
    && line.chars().all(|c| c.is_ascii_digit())
  {
    head
  } else {
    msg
  }
}

pub fn setup_panic_hook() {
  std::panic::set_hook(Box::new(|panic_info| {
    let thread_handle = std::thread::current();
    let thread_name = thread_handle.name().unwrap_or("unnamed");

    let location = match panic_info.location() {
      Some(location) => {
        format!("{}:{}", caller_file_name(location), location.line())
      }
      None => "unknown location".to_string(),
    };

    let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
      s.to_string()
    } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
      s.clone()
    } else {
      "unknown panic message".to_string()
    };

    // Blocking write: the subscriber may never flush once the runtime aborts.
    eprintln!(
      "\n\n================================================\n\
     A FATAL PANIC OCCURRED. FUNCTION TERMINATING.\n\
     ================================================\n\n\
     Panic Details:\n\
     > Message:  {message}\n\
     > Location: {location}\n\
     > Thread:   {thread_name}\n"
    );
  }));
}

/// Installs the global subscriber: stderr always, plus a daily rolling file
/// under `log_dir` when one is given. Keep the returned guard alive for the
/// whole process or buffered file lines are lost.
pub fn init_logging(log_dir: Option<&str>) -> Option<WorkerGuard> {
  let crate_name = env!("CARGO_PKG_NAME");
  let crate_name_target = crate_name.replace('-', "_");
  let default_crate_level = "debug";

  // DRIVE_FOLDER_MAP_LOG
  let env_filter_var_name =
    format!("{}_LOG", crate_name.to_uppercase().replace('-', "_"));
  let default_filter = format!("{crate_name_target}={default_crate_level}");

  let env_filter = EnvFilter::new(
    std::env::var(&env_filter_var_name).unwrap_or(default_filter),
  );

  // stderr, not stdout: the hosting platform collects stderr as log entries
  let stderr_layer = tracing_subscriber::fmt::layer()
    .with_writer(std::io::stderr)
    .with_ansi(false)
    .with_target(true)
    .with_level(true)
    .with_file(true)
    .with_line_number(true)
    .with_timer(tracing_subscriber::fmt::time::LocalTime::rfc_3339());

  let mut file_layer_option = None;
  let mut log_guard: Option<WorkerGuard> = None;

  if let Some(dir) = log_dir {
    match std::fs::create_dir_all(dir) {
      Ok(_) => {
        let file_appender = rolling::daily(dir, format!("{crate_name}.log"));
        let (non_blocking_writer, guard) = non_blocking(file_appender);

        let file_layer = tracing_subscriber::fmt::layer()
          .with_writer(non_blocking_writer)
          .with_ansi(false)
          .with_target(true)
          .with_level(true)
          .with_file(true)
          .with_line_number(true);

        file_layer_option = Some(file_layer);
        log_guard = Some(guard);
      }
      Err(e) => {
        eprintln!(
          "[{crate_name}] Failed to create log directory '{dir}'. File logging disabled. Error: {e}"
        );
      }
    }
  }

  let registry = tracing_subscriber::registry()
    .with(env_filter)
    .with(ErrorLayer::default())
    .with(stderr_layer);

  let init_result = match file_layer_option {
    Some(file_layer) => registry.with(file_layer).try_init(),
    None => registry.try_init(),
  };

  if init_result.is_err() {
    eprintln!("Failed to initialize tracing subscriber. Logging may not work.");
    return None;
  }

  eprintln!(
    "[{crate_name}] Logging initialized. Log level '{default_crate_level}'. Override with env var '{env_filter_var_name}'"
  );

  log_guard
}
