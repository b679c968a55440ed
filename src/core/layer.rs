//! tracing 接入层
//!
//! [`SinkLayer`] 实现 `tracing_subscriber::Layer`，把每个 tracing 事件转换为
//! [`LogEvent`] 后同步交给 sink。字段提取方式：
//!
//! - `message` 字段作为消息模板，其余字段进入 `fields`
//! - metadata 的 target、文件、行号、模块路径映射到对应属性
//! - 最内层 span 的名称作为 `func_name`（`#[instrument]` 以函数名命名 span）

use crate::core::event::{FieldValue, LogEvent, LogLevel};
use crate::sinks::traits::RecordSink;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

/// 把 tracing 事件写入 sink 的层
#[derive(Debug)]
pub struct SinkLayer<K> {
    sink: Arc<K>,
}

impl<K: RecordSink> SinkLayer<K> {
    pub fn new(sink: K) -> Self {
        Self::from_shared(Arc::new(sink))
    }

    /// 使用调用方共享的 sink，便于之后通过同一个 `Arc` 关闭它
    pub fn from_shared(sink: Arc<K>) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &Arc<K> {
        &self.sink
    }
}

impl<K> Clone for SinkLayer<K> {
    fn clone(&self) -> Self {
        Self {
            sink: Arc::clone(&self.sink),
        }
    }
}

impl<S, K> Layer<S> for SinkLayer<K>
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
    K: RecordSink + 'static,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        // 关闭后的 sink 相当于已从框架上摘除
        if self.sink.is_closed() {
            return;
        }

        let func_name = ctx
            .event_scope(event)
            .and_then(|mut scope| scope.next())
            .map(|span| span.name().to_string());

        let log_event = capture_event(event, func_name);

        // 不能在这里用 tracing 宏报告错误，否则会重入本层
        if let Err(e) = self.sink.send_event(&log_event) {
            eprintln!("logstore: failed to persist log event: {}", e);
        }
    }
}

/// 将 tracing 事件转换为 [`LogEvent`]
pub fn capture_event(event: &Event<'_>, func_name: Option<String>) -> LogEvent {
    let metadata = event.metadata();

    let mut visitor = EventFieldVisitor::default();
    event.record(&mut visitor);

    let mut log_event = LogEvent::new(
        metadata.target(),
        LogLevel::from_tracing(metadata.level()),
        visitor.message.unwrap_or_default(),
    );

    match metadata.file() {
        Some(file) => log_event = log_event.with_location(file, metadata.line()),
        None => log_event.lineno = metadata.line(),
    }
    log_event.module = metadata.module_path().map(str::to_string);
    log_event.func_name = func_name;
    log_event.fields = visitor.fields;
    log_event
}

/// 提取事件字段的访问器
#[derive(Default)]
struct EventFieldVisitor {
    message: Option<String>,
    fields: BTreeMap<String, FieldValue>,
}

impl EventFieldVisitor {
    fn insert(&mut self, field: &Field, value: FieldValue) {
        self.fields.insert(field.name().to_string(), value);
    }
}

impl Visit for EventFieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{:?}", value));
        } else {
            self.insert(field, FieldValue::Debug(format!("{:?}", value)));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.insert(field, FieldValue::from(value));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, FieldValue::I64(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, FieldValue::U64(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, FieldValue::F64(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, FieldValue::Bool(value));
    }
}
