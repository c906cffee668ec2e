//! End-to-end pipeline tests without a broker.
//!
//! A loopback sink turns every flushed publish into a record on a
//! `ChannelSource`, which the dispatcher then decodes and hands to the
//! handler.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use apache_avro::types::Value;
use apache_avro::Schema;
use kafka_types::encode_framed;
use kafkalib::{
    AvroDecoder, CancellationToken, ChannelSource, DispatchStats, Dispatcher,
    InMemorySchemaRegistry, Message, MessageSink, OutgoingRecord, Payload, ProducerConfig,
    Publisher,
};
use serde::Deserialize;
use tokio::sync::mpsc;

const ORDER_SCHEMA: &str = r#"{
    "type": "record",
    "name": "Order",
    "fields": [
        {"name": "id", "type": "long"},
        {"name": "customer", "type": "string"},
        {"name": "total", "type": "double"},
        {"name": "note", "type": ["null", "string"], "default": null}
    ]
}"#;

#[derive(Debug, Deserialize, PartialEq)]
struct Order {
    id: i64,
    customer: String,
    total: f64,
    note: Option<String>,
}

type Records = mpsc::Sender<kafkalib_kafka_source::Result<Message>>;

/// Delivers flushed records to a channel as if they had gone through a broker.
struct LoopbackSink {
    queued: Mutex<Vec<Message>>,
    next_offset: AtomicI64,
    tx: Records,
}

impl LoopbackSink {
    fn new(tx: Records) -> Self {
        Self {
            queued: Mutex::new(Vec::new()),
            next_offset: AtomicI64::new(0),
            tx,
        }
    }
}

impl MessageSink for LoopbackSink {
    fn enqueue(&self, record: OutgoingRecord<'_>) -> kafkalib_kafka_producer::Result<()> {
        let offset = self.next_offset.fetch_add(1, Ordering::SeqCst);
        let mut message = Message::new(record.topic, 0, offset, record.payload.to_vec());
        message.key = record.key.map(|k| k.to_vec());
        self.queued.lock().unwrap().push(message);
        Ok(())
    }

    fn flush(&self, _timeout: Duration) -> kafkalib_kafka_producer::Result<()> {
        let queued: Vec<Message> = self.queued.lock().unwrap().drain(..).collect();
        for message in queued {
            self.tx.try_send(Ok(message)).unwrap();
        }
        Ok(())
    }
}

fn order_schema() -> Schema {
    Schema::parse_str(ORDER_SCHEMA).unwrap()
}

fn order_value(id: i64, customer: &str, total: f64, note: Option<&str>) -> Value {
    let note = match note {
        Some(note) => Value::Union(1, Box::new(Value::String(note.to_string()))),
        None => Value::Union(0, Box::new(Value::Null)),
    };
    Value::Record(vec![
        ("id".to_string(), Value::Long(id)),
        ("customer".to_string(), Value::String(customer.to_string())),
        ("total".to_string(), Value::Double(total)),
        ("note".to_string(), note),
    ])
}

/// Run the dispatcher until the source is drained, collecting handled records.
async fn drain(dispatcher: Dispatcher<ChannelSource>, seen: Arc<Mutex<Vec<Message>>>) -> (DispatchStats, Vec<Message>) {
    let stats = dispatcher.run(CancellationToken::new()).await;
    let mut seen = seen.lock().unwrap().clone();
    seen.sort_by_key(|m| m.offset);
    (stats, seen)
}

fn collecting_handler(
    seen: Arc<Mutex<Vec<Message>>>,
) -> impl Fn(Message) -> std::future::Ready<anyhow::Result<()>> + Send + Sync + 'static {
    move |message: Message| {
        seen.lock().unwrap().push(message);
        std::future::ready(Ok(()))
    }
}

#[tokio::test]
async fn test_published_json_reaches_handler() {
    let (tx, source) = ChannelSource::new(16);
    let publisher = Publisher::with_sink(ProducerConfig::default(), Arc::new(LoopbackSink::new(tx)));

    publisher
        .publish("orders", r#"{"id": 1, "customer": "ada", "total": 12.5, "note": null}"#)
        .await
        .unwrap();
    publisher
        .publish_keyed("orders", "bob", r#"{"id": 2, "customer": "bob", "total": 3.0, "note": "gift"}"#)
        .await
        .unwrap();
    drop(publisher);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let dispatcher = Dispatcher::new(source, collecting_handler(seen.clone()));
    let (stats, seen) = drain(dispatcher, seen).await;

    assert_eq!(stats.received, 2);
    assert_eq!(stats.handled, 2);

    let orders: Vec<Order> = seen.iter().map(|m| kafkalib::parse_json(m).unwrap()).collect();
    assert_eq!(
        orders,
        vec![
            Order { id: 1, customer: "ada".to_string(), total: 12.5, note: None },
            Order { id: 2, customer: "bob".to_string(), total: 3.0, note: Some("gift".to_string()) },
        ]
    );
    assert_eq!(seen[1].key.as_deref(), Some(&b"bob"[..]));
}

#[tokio::test]
async fn test_registry_framed_avro_is_decoded_and_bad_records_are_contained() {
    let registry = InMemorySchemaRegistry::new();
    registry.register_str(7, ORDER_SCHEMA).unwrap();

    let (tx, source) = ChannelSource::new(16);
    let publisher = Publisher::with_sink(ProducerConfig::default(), Arc::new(LoopbackSink::new(tx)));

    let body = apache_avro::to_avro_datum(&order_schema(), order_value(10, "cy", 99.0, Some("rush")))
        .unwrap();
    let framed = encode_framed(7, &body);
    let unknown_schema = encode_framed(8, &body);
    let short = [0u8, 0, 0];

    for payload in [&framed[..], &unknown_schema[..], &short[..], b"plain text"] {
        publisher
            .send(OutgoingRecord::new("orders", payload))
            .await
            .unwrap();
    }
    drop(publisher);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let dispatcher = Dispatcher::new(source, collecting_handler(seen.clone()))
        .with_decoder(AvroDecoder::new(Arc::new(registry)))
        .with_max_in_flight(2);
    let (stats, seen) = drain(dispatcher, seen).await;

    assert_eq!(stats.received, 4);
    assert_eq!(stats.decode_failures, 1);
    assert_eq!(stats.handled, 3);

    // Offset 1 carried the unknown schema id and was dropped.
    let offsets: Vec<i64> = seen.iter().map(|m| m.offset).collect();
    assert_eq!(offsets, vec![0, 2, 3]);

    assert_eq!(seen[0].schema_id(), Some(7));
    let order: Order = seen[0].parse_json().unwrap();
    assert_eq!(
        order,
        Order { id: 10, customer: "cy".to_string(), total: 99.0, note: Some("rush".to_string()) }
    );

    assert_eq!(seen[1].payload, Payload::Raw(vec![0, 0, 0]));
    assert_eq!(seen[2].payload_text(), "plain text");
}

#[tokio::test]
async fn test_failing_handler_does_not_stop_the_pipeline() {
    let (tx, source) = ChannelSource::new(16);
    let publisher = Publisher::with_sink(ProducerConfig::default(), Arc::new(LoopbackSink::new(tx)));
    for text in ["ok-1", "boom", "not json", "ok-2"] {
        publisher.publish("events", text).await.unwrap();
    }
    drop(publisher);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let handler = {
        let seen = seen.clone();
        move |message: Message| {
            let seen = seen.clone();
            async move {
                let text = message.payload_text();
                if text == "boom" {
                    panic!("handler exploded");
                }
                if text == "not json" {
                    message.parse_json::<serde_json::Value>()?;
                }
                seen.lock().unwrap().push(message);
                anyhow::Ok(())
            }
        }
    };
    let (stats, seen) = drain(Dispatcher::new(source, handler), seen).await;

    assert_eq!(stats.received, 4);
    assert_eq!(stats.handled, 2);
    assert_eq!(stats.handler_failures, 2);
    let texts: Vec<String> = seen.iter().map(|m| m.payload_text()).collect();
    assert_eq!(texts, vec!["ok-1", "ok-2"]);
}
