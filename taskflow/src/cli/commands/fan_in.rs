use super::{demo_rng, jittered_delay};
use crate::core::OrchestrationConfig;
use crate::engine::{FanIn, StreamProducer};
use anyhow::Result;
use futures::stream::{self, BoxStream, StreamExt};
use std::time::Instant;
use tokio::time::sleep;

/// 1つのProducerが送るメッセージ列。各メッセージの前に模擬遅延を挟む
fn message_stream(
    producer_id: usize,
    messages: usize,
    delay_ms: u64,
    seed: Option<u64>,
) -> BoxStream<'static, String> {
    let rng = demo_rng(seed, producer_id as u64);
    stream::unfold((1, rng), move |(message, mut rng)| async move {
        if message > messages {
            println!("[Producer] ✅ Producer {producer_id} has finished sending messages");
            return None;
        }
        let delay = jittered_delay(&mut rng, delay_ms);
        sleep(delay).await;
        let text = format!("📩 Producer {producer_id} sent message {message} after {delay:?}");
        Some((text, (message + 1, rng)))
    })
    .boxed()
}

/// 複数Producerのメッセージを1つのキューへ集約して受信する
pub async fn execute_fan_in(
    config: &impl OrchestrationConfig,
    producers: usize,
    messages: usize,
    delay_ms: u64,
    seed: Option<u64>,
) -> Result<Vec<String>> {
    let started = Instant::now();
    let sources: Vec<_> = (1..=producers)
        .map(|id| StreamProducer::new(message_stream(id, messages, delay_ms, seed)))
        .collect();

    let fan_in = FanIn::aggregate(sources, config.queue_capacity());
    let output = fan_in.output();

    let mut received = Vec::new();
    while let Some(message) = output.pop().await {
        println!("[Consumer] Received: {message}");
        received.push(message);
    }
    println!("[Main] All producers finished. Results queue closed.");
    fan_in.join().await?;

    println!("\n🏁 All messages received in {:?}", started.elapsed());
    Ok(received)
}
