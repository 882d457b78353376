//! Convenience operations: emitted envelopes, one-time response handlers and
//! transport passthrough.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod common;

use serde::ser::Error as _;
use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};

use cfws_client::router::Outgoing;
use cfws_client::ReadyState;
use common::{connection, frame, open, Log};

fn last_sent(conn: &cfws_client::Connection<common::MockTransport>) -> Value {
    conn.transport().sent_json().pop().expect("nothing sent")
}

#[test]
fn subscribe_and_unsubscribe_envelopes() {
    let mut conn = connection("");
    open(&mut conn);

    let mut opts = Map::new();
    opts.insert("selector".into(), json!("x > 1"));
    conn.subscribe("news", Some(opts));
    let sub = last_sent(&conn);
    assert_eq!(sub["type"], "subscribe");
    assert_eq!(sub["channel"], "news");
    assert_eq!(sub["customOptions"]["selector"], "x > 1");

    conn.unsubscribe("news");
    let unsub = last_sent(&conn);
    assert_eq!(unsub["type"], "unsubscribe");
    assert_eq!(unsub["channel"], "news");
}

#[test]
fn subscribe_with_registers_channel_handler() {
    let log = Log::new();
    let mut conn = connection("");
    open(&mut conn);
    conn.subscribe_with("news", None, log.data("news"));
    assert!(conn.registry().has_channel("news"));

    frame(&mut conn, r#"{"type":"data","channelname":"news","data":"{\"n\":7}"}"#);
    assert_eq!(log.entries(), [r#"news:{"n":7}"#]);
}

#[test]
fn publish_round_trips_through_data_frame() {
    let got = std::sync::Arc::new(std::sync::Mutex::new(None));
    let g = std::sync::Arc::clone(&got);
    let mut conn = connection("");
    open(&mut conn);

    let mut opts = Map::new();
    opts.insert("priority".into(), json!(2));
    conn.on_channel("c", move |e| *g.lock().unwrap() = e.data().cloned())
        .publish("c", &json!({"x": 1}), Some(opts));

    let env = last_sent(&conn);
    assert_eq!(env["type"], "publish");
    assert_eq!(env["channel"], "c");
    assert_eq!(env["customOptions"]["priority"], 2);
    let text = env["data"].as_str().expect("data travels as text");
    assert_eq!(serde_json::from_str::<Value>(text).unwrap(), json!({"x": 1}));

    // server fan-out of the same payload
    let echo = json!({"type": "data", "channelname": "c", "data": text}).to_string();
    frame(&mut conn, &echo);
    assert_eq!(*got.lock().unwrap(), Some(json!({"x": 1})));
}

#[derive(Serialize)]
struct Note<'a> {
    title: &'a str,
    tags: Vec<&'a str>,
}

#[test]
fn publish_accepts_any_serializable() {
    let mut conn = connection("");
    open(&mut conn);
    conn.publish("notes", &Note { title: "t", tags: vec!["a"] }, None);
    let env = last_sent(&conn);
    let decoded: Value = serde_json::from_str(env["data"].as_str().unwrap()).unwrap();
    assert_eq!(decoded, json!({"title": "t", "tags": ["a"]}));
}

struct Broken;

impl Serialize for Broken {
    fn serialize<S: Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
        Err(S::Error::custom("broken"))
    }
}

#[test]
fn unserializable_publish_still_goes_out_without_data() {
    let mut conn = connection("");
    open(&mut conn);
    conn.publish("c", &Broken, None);
    let env = last_sent(&conn);
    assert_eq!(env["type"], "publish");
    assert!(env.get("data").is_none());
}

#[test]
fn authenticate_with_handles_one_response() {
    let log = Log::new();
    let mut conn = connection("");
    open(&mut conn);
    conn.on("authenticate", log.tag("persistent"))
        .authenticate_with("ann", "secret", log.tag("callback"));

    let env = last_sent(&conn);
    assert_eq!(env["type"], "authenticate");
    assert_eq!(env["username"], "ann");
    assert_eq!(env["password"], "secret");
    assert!(env.get("channel").is_none());

    let ack = r#"{"reqType":"authenticate","code":0,"msg":"ok"}"#;
    frame(&mut conn, ack);
    frame(&mut conn, ack);
    assert_eq!(log.entries(), ["callback", "persistent"]);
}

#[test]
fn subscriber_count_and_subscriptions_requests() {
    let counts = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
    let c = std::sync::Arc::clone(&counts);
    let log = Log::new();
    let mut conn = connection("");
    open(&mut conn);

    conn.get_subscriber_count_with("news", move |e| {
        let m = e.message().unwrap();
        c.lock().unwrap().push(m.body["subscriberCount"].clone());
    });
    let env = last_sent(&conn);
    assert_eq!(env["type"], "getSubscriberCount");
    assert_eq!(env["channel"], "news");

    conn.get_subscriptions_with(log.tag("subs"));
    assert_eq!(last_sent(&conn)["type"], "getSubscriptions");

    frame(&mut conn, r#"{"reqType":"getSubscriberCount","code":0,"subscriberCount":3}"#);
    frame(&mut conn, r#"{"reqType":"getSubscriberCount","code":0,"subscriberCount":4}"#);
    frame(&mut conn, r#"{"reqType":"getSubscriptions","code":0,"channels":["news"]}"#);
    assert_eq!(*counts.lock().unwrap(), [json!(3)]);
    assert_eq!(log.entries(), ["subs"]);
}

#[test]
fn control_messages_while_connecting_are_swallowed() {
    let mut conn = connection("");
    conn.subscribe("news", None).publish("news", &1, None);
    assert!(conn.transport().sent.is_empty());
}

#[test]
fn send_serializes_structured_values_only() {
    let mut conn = connection("");
    open(&mut conn);
    conn.send(json!({"raw": true})).unwrap().send("plain text").unwrap();
    conn.send(Outgoing::Text("{\"already\":1}".into())).unwrap();

    let sent = &conn.transport().sent;
    assert_eq!(sent[1], r#"{"raw":true}"#);
    assert_eq!(sent[2], "plain text");
    assert_eq!(sent[3], r#"{"already":1}"#);
}

#[test]
fn send_propagates_transport_errors() {
    let mut conn = connection("");
    let err = conn.send("early").err().expect("must fail while connecting");
    assert_eq!(err.kind().as_str(), "INVALID_STATE_ERR");
}

#[test]
fn close_validates_and_passes_through() {
    let mut conn = connection("");
    open(&mut conn);

    let err = conn.close(Some(1001), None).err().expect("reserved code");
    assert_eq!(err.kind().as_str(), "INVALID_ACCESS_ERR");

    let long = "x".repeat(124);
    let err = conn.close(Some(1000), Some(&long)).err().expect("long reason");
    assert_eq!(err.kind().as_str(), "SYNTAX_ERR");

    conn.close(Some(4000), Some("bye")).unwrap();
    assert_eq!(
        conn.transport().closed_with,
        Some((Some(4000), Some("bye".to_string())))
    );
    assert_eq!(conn.ready_state(), ReadyState::Closing);
    assert!(!conn.is_connection_open());
}

#[test]
fn close_connection_is_plain_close() {
    let mut conn = connection("");
    open(&mut conn);
    conn.close_connection().unwrap();
    assert_eq!(conn.transport().closed_with, Some((None, None)));
}

#[test]
fn open_connection_is_noop_while_open() {
    let mut conn = connection("");
    open(&mut conn);
    assert!(conn.is_connection_open());
    conn.open_connection(None).unwrap();

    conn.transport_mut().state = ReadyState::Closed;
    let err = conn.open_connection(None).err().expect("mock cannot reopen");
    assert_eq!(err.kind().as_str(), "INVALID_STATE_ERR");
}

#[test]
fn passthrough_accessors_delegate() {
    let conn = connection("");
    assert_eq!(conn.url(), "ws://test.local/cfusion");
    assert_eq!(conn.protocol(), "");
    assert_eq!(conn.buffered_amount(), 0);
    assert_eq!(conn.ready_state(), ReadyState::Connecting);
}
