//! Tests for the token stream lifecycle.

use futures_util::{StreamExt, pin_mut};
use llm::{Error, MockEngine};
use runtime::{Llm, STOP_MARKER};
use std::{path::Path, time::Duration};

async fn loaded(engine: MockEngine) -> Llm<MockEngine> {
    let llm = Llm::new(engine);
    llm.load(Path::new("model.gguf")).await.unwrap();
    llm
}

#[tokio::test]
async fn unloaded_model_terminates_with_error() {
    let llm = Llm::new(MockEngine::new().chunks(["never"]));
    let stream = llm.stream("hi");
    pin_mut!(stream);

    assert!(matches!(
        stream.next().await,
        Some(Err(Error::ModelNotLoaded))
    ));
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn chunks_arrive_in_generation_order() {
    let llm = loaded(MockEngine::new().chunks(["Hi", " there", "!"])).await;

    let chunks: Vec<_> = llm.stream("hello").collect().await;
    let chunks: Vec<String> = chunks.into_iter().map(|c| c.unwrap()).collect();
    assert_eq!(chunks, ["Hi", " there", "!"]);
}

#[tokio::test]
async fn generation_error_is_terminal() {
    let llm = loaded(MockEngine::new().chunks(["a", "b"]).fail_after(1)).await;

    let stream = llm.stream("hello");
    pin_mut!(stream);
    assert_eq!(stream.next().await.unwrap().unwrap(), "a");
    assert!(matches!(
        stream.next().await,
        Some(Err(Error::Generation(_)))
    ));
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn stop_appends_marker_after_received_tokens() {
    let engine = MockEngine::new()
        .chunks(["one", "two", "three"])
        .delay(Duration::from_millis(150));
    let llm = loaded(engine).await;

    let stream = llm.stream("long task");
    pin_mut!(stream);
    assert_eq!(stream.next().await.unwrap().unwrap(), "one");

    llm.stop();
    assert_eq!(stream.next().await.unwrap().unwrap(), STOP_MARKER);
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn stop_while_idle_is_a_noop() {
    let llm = loaded(MockEngine::new().chunks(["ok"])).await;
    llm.stop();

    let chunks: Vec<_> = llm.stream("hello").collect().await;
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].as_ref().unwrap(), "ok");
}

#[tokio::test]
async fn superseding_cancels_the_previous_stream() {
    let engine = MockEngine::new()
        .chunks(["one", "two", "three"])
        .delay(Duration::from_millis(150));
    let llm = loaded(engine.clone()).await;

    let first = llm.stream("first");
    pin_mut!(first);
    assert_eq!(first.next().await.unwrap().unwrap(), "one");

    // Starting a new stream discards the previous one before it can emit
    // another token.
    let second = llm.stream("second");
    pin_mut!(second);

    assert_eq!(first.next().await.unwrap().unwrap(), STOP_MARKER);
    assert!(first.next().await.is_none());

    let chunks: Vec<_> = second.collect().await;
    let chunks: Vec<String> = chunks.into_iter().map(|c| c.unwrap()).collect();
    assert_eq!(chunks, ["one", "two", "three"]);
    assert_eq!(engine.prompts_seen(), ["first", "second"]);
}

#[tokio::test]
async fn session_survives_across_streams_until_reset() {
    let engine = MockEngine::new().chunks(["ok"]);
    let llm = loaded(engine.clone()).await;

    let _: Vec<_> = llm.stream("a").collect().await;
    let _: Vec<_> = llm.stream("b").collect().await;
    assert_eq!(engine.sessions_opened(), 1);

    llm.reset();
    let _: Vec<_> = llm.stream("c").collect().await;
    assert_eq!(engine.sessions_opened(), 2);
}

#[tokio::test]
async fn instructions_apply_to_new_sessions() {
    let engine = MockEngine::new().chunks(["ok"]);
    let llm = loaded(engine.clone()).await;

    llm.set_instructions("Be brief.");
    let _: Vec<_> = llm.stream("a").collect().await;

    llm.reset();
    llm.set_instructions("Be verbose.");
    let _: Vec<_> = llm.stream("b").collect().await;

    assert_eq!(engine.instructions_seen(), ["Be brief.", "Be verbose."]);
}
