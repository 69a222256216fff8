//! Minimal Prometheus registry for HTTP request metrics.
//!
//! Series are keyed by `(method, path, status)` in a `DashMap` so the hot
//! path never takes a global lock. `path` is always a route template such as
//! `/api/contacts/{id}`, never a raw URI, which keeps cardinality bounded.

use std::{
  fmt::Write as _,
  sync::atomic::{AtomicU64, Ordering},
  time::{Duration, Instant},
};

use dashmap::DashMap;
use sysinfo::{ProcessRefreshKind, RefreshKind, System};

/// Upper bounds in seconds: `0.001 * 5^n` for `n` in `0..6`.
pub const BUCKETS_SECONDS: [f64; 6] = [0.001, 0.005, 0.025, 0.125, 0.625, 3.125];

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
  v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RequestLabels {
  method: String,
  path:   String,
  status: u16,
}

impl RequestLabels {
  fn render(&self) -> String {
    format!(
      "method=\"{}\",path=\"{}\",status=\"{}\"",
      escape_label(&self.method),
      escape_label(&self.path),
      self.status
    )
  }
}

struct RequestSeries {
  count:   AtomicU64,
  /// Sum of observed durations, in microseconds.
  sum_us:  AtomicU64,
  buckets: [AtomicU64; BUCKETS_SECONDS.len()],
}

impl Default for RequestSeries {
  fn default() -> Self {
    Self {
      count:   AtomicU64::new(0),
      sum_us:  AtomicU64::new(0),
      buckets: std::array::from_fn(|_| AtomicU64::new(0)),
    }
  }
}

/// Labels of the `build_info` gauge.
#[derive(Debug, Clone)]
pub struct BuildInfo {
  pub title:    String,
  pub version:  String,
  /// VCS revision, from `ROLO_BUILD_REVISION` at compile time.
  pub revision: String,
  /// Build timestamp, from `ROLO_BUILD_CREATED` at compile time.
  pub created:  String,
}

impl BuildInfo {
  pub fn from_env(title: impl Into<String>) -> Self {
    Self {
      title:    title.into(),
      version:  env!("CARGO_PKG_VERSION").to_owned(),
      revision: option_env!("ROLO_BUILD_REVISION").unwrap_or("unknown").to_owned(),
      created:  option_env!("ROLO_BUILD_CREATED").unwrap_or("unknown").to_owned(),
    }
  }
}

struct ProcessStats {
  resident_bytes: u64,
  virtual_bytes:  u64,
  start_time:     u64,
}

/// Memory and start time of this process, if the platform reports them.
fn process_stats() -> Option<ProcessStats> {
  let pid = sysinfo::get_current_pid().ok()?;
  let system = System::new_with_specifics(
    RefreshKind::new().with_processes(ProcessRefreshKind::new().with_memory()),
  );
  let process = system.process(pid)?;
  Some(ProcessStats {
    resident_bytes: process.memory(),
    virtual_bytes:  process.virtual_memory(),
    start_time:     process.start_time(),
  })
}

/// Registry backing `/metrics`.
pub struct Metrics {
  build:    BuildInfo,
  started:  Instant,
  requests: DashMap<RequestLabels, RequestSeries>,
}

impl Metrics {
  pub fn new(build: BuildInfo) -> Self {
    Self {
      build,
      started: Instant::now(),
      requests: DashMap::new(),
    }
  }

  /// Count one finished request and record how long it took.
  pub fn observe_request(&self, method: &str, path: &str, status: u16, elapsed: Duration) {
    let key = RequestLabels {
      method: method.to_owned(),
      path: path.to_owned(),
      status,
    };
    let series = self.requests.entry(key).or_default();
    let secs = elapsed.as_secs_f64();

    series.count.fetch_add(1, Ordering::Relaxed);
    series
      .sum_us
      .fetch_add(u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX), Ordering::Relaxed);
    for (bucket, &le) in series.buckets.iter().zip(BUCKETS_SECONDS.iter()) {
      if secs <= le {
        bucket.fetch_add(1, Ordering::Relaxed);
      }
    }
  }

  /// Render everything in Prometheus text exposition format, followed by
  /// caller-supplied gauges.
  pub fn render(&self, gauges: &[(&str, u64)]) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "# TYPE build_info gauge");
    let _ = writeln!(
      out,
      "build_info{{title=\"{}\",version=\"{}\",revision=\"{}\",created=\"{}\"}} 1",
      escape_label(&self.build.title),
      escape_label(&self.build.version),
      escape_label(&self.build.revision),
      escape_label(&self.build.created)
    );
    let _ = writeln!(out, "# TYPE process_uptime_seconds gauge");
    let _ = writeln!(
      out,
      "process_uptime_seconds {:.3}",
      self.started.elapsed().as_secs_f64()
    );
    if let Some(p) = process_stats() {
      let _ = writeln!(out, "# TYPE process_resident_memory_bytes gauge");
      let _ = writeln!(out, "process_resident_memory_bytes {}", p.resident_bytes);
      let _ = writeln!(out, "# TYPE process_virtual_memory_bytes gauge");
      let _ = writeln!(out, "process_virtual_memory_bytes {}", p.virtual_bytes);
      let _ = writeln!(out, "# TYPE process_start_time_seconds gauge");
      let _ = writeln!(out, "process_start_time_seconds {}", p.start_time);
    }

    let _ = writeln!(out, "# TYPE http_requests_total counter");
    for r in self.requests.iter() {
      let _ = writeln!(
        out,
        "http_requests_total{{{}}} {}",
        r.key().render(),
        r.value().count.load(Ordering::Relaxed)
      );
    }

    let _ = writeln!(out, "# TYPE http_request_duration_seconds histogram");
    for r in self.requests.iter() {
      let labels = r.key().render();
      let series = r.value();
      // Buckets are already cumulative: each observation bumped every bucket
      // whose bound it fits under.
      for (bucket, le) in series.buckets.iter().zip(BUCKETS_SECONDS.iter()) {
        let _ = writeln!(
          out,
          "http_request_duration_seconds_bucket{{{labels},le=\"{le}\"}} {}",
          bucket.load(Ordering::Relaxed)
        );
      }
      let count = series.count.load(Ordering::Relaxed);
      let _ = writeln!(
        out,
        "http_request_duration_seconds_bucket{{{labels},le=\"+Inf\"}} {count}"
      );
      let sum = series.sum_us.load(Ordering::Relaxed) as f64 / 1e6;
      let _ = writeln!(out, "http_request_duration_seconds_sum{{{labels}}} {sum}");
      let _ = writeln!(out, "http_request_duration_seconds_count{{{labels}}} {count}");
    }

    for (name, value) in gauges {
      let _ = writeln!(out, "# TYPE {name} gauge\n{name} {value}");
    }
    out
  }
}
