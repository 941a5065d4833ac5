// TaskQueue - 有界FIFOキュー
// 複数Producer・複数Consumerで共有されるハンドオフバッファ

use crate::core::QueueError;
use futures::Stream;
use std::collections::VecDeque;
use std::pin::pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;
use tracing::debug;

struct State<T> {
    buffer: VecDeque<T>,
    closed: bool,
    /// これまでに投入された要素数
    pushed: u64,
    /// これまでに取り出された要素数
    taken: u64,
    /// 空のキューで待機中のpop数
    parked: usize,
}

struct Shared<T> {
    capacity: usize,
    state: Mutex<State<T>>,
    not_empty: Notify,
    not_full: Notify,
}

/// 有界FIFOキュー
///
/// - `capacity > 0`: バッファ付き。満杯の間 `push` は待機する
/// - `capacity == 0`: 同期ハンドオフ。Consumerが要素を受け取るまで `push` は完了しない
///
/// クローズ後の `push` は要素を `QueueError::Closed` で返却し、`pop` は残りを
/// 排出し切ってから `None`（枯渇）を返す。ハンドルは `Clone` で共有する。
pub struct TaskQueue<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for TaskQueue<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> std::fmt::Debug for TaskQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("TaskQueue")
            .field("capacity", &self.shared.capacity)
            .field("len", &state.buffer.len())
            .field("closed", &state.closed)
            .finish()
    }
}

/// 待機中のpopを数えるガード。futureがdropされても必ず戻す
struct ParkedGuard<'a, T> {
    queue: &'a TaskQueue<T>,
}

impl<T> Drop for ParkedGuard<'_, T> {
    fn drop(&mut self) {
        self.queue.lock().parked -= 1;
    }
}

/// 容量0のpushが待機中にdropされたら、未受け渡しの要素を取り戻すガード
struct PendingHandoff<'a, T> {
    queue: &'a TaskQueue<T>,
    ticket: u64,
    armed: bool,
}

impl<T> Drop for PendingHandoff<'_, T> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let withdrawn = TaskQueue::withdraw(&mut self.queue.lock(), self.ticket);
        if withdrawn.is_some() {
            self.queue.shared.not_full.notify_waiters();
        }
    }
}

impl<T> TaskQueue<T> {
    /// 指定容量のキューを作成
    pub fn new(capacity: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                capacity,
                state: Mutex::new(State {
                    buffer: VecDeque::with_capacity(capacity.max(1)),
                    closed: false,
                    pushed: 0,
                    taken: 0,
                    parked: 0,
                }),
                not_empty: Notify::new(),
                not_full: Notify::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// バッファに同時に置ける要素数（容量0でもハンドオフ用に1枠）
    fn slot_limit(&self) -> usize {
        self.shared.capacity.max(1)
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    pub fn len(&self) -> usize {
        self.lock().buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().buffer.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// 要素を投入する。満杯の間は待機する
    pub async fn push(&self, item: T) -> Result<(), QueueError<T>> {
        let ticket = loop {
            let mut notified = pin!(self.shared.not_full.notified());
            notified.as_mut().enable();

            {
                let mut state = self.lock();
                if state.closed {
                    return Err(QueueError::Closed(item));
                }
                if state.buffer.len() < self.slot_limit() {
                    state.buffer.push_back(item);
                    state.pushed += 1;
                    let ticket = state.pushed;
                    drop(state);
                    self.shared.not_empty.notify_waiters();
                    break ticket;
                }
            }

            notified.await;
        };

        if self.shared.capacity == 0 {
            return self.await_handoff(ticket).await;
        }

        Ok(())
    }

    /// 同期ハンドオフ: 自分の要素が取り出されるまで戻らない
    ///
    /// 取り出される前にクローズされるか、futureがdropされた場合は
    /// 要素をハンドオフ枠から取り戻す。
    async fn await_handoff(&self, ticket: u64) -> Result<(), QueueError<T>> {
        let mut pending = PendingHandoff {
            queue: self,
            ticket,
            armed: true,
        };

        loop {
            let mut notified = pin!(self.shared.not_full.notified());
            notified.as_mut().enable();

            {
                let mut state = self.lock();
                if state.taken >= ticket {
                    pending.armed = false;
                    return Ok(());
                }
                if state.closed {
                    pending.armed = false;
                    let withdrawn = Self::withdraw(&mut state, ticket);
                    drop(state);
                    self.shared.not_full.notify_waiters();
                    return match withdrawn {
                        Some(item) => Err(QueueError::Closed(item)),
                        None => Ok(()),
                    };
                }
            }

            notified.await;
        }
    }

    /// まだ取り出されていない `ticket` 番目の要素をバッファから外す
    fn withdraw(state: &mut State<T>, ticket: u64) -> Option<T> {
        if state.taken >= ticket {
            return None;
        }
        let position = usize::try_from(ticket - 1 - state.taken).ok()?;
        let item = state.buffer.remove(position)?;
        state.pushed -= 1;
        Some(item)
    }

    /// 待機せずに投入する
    ///
    /// 容量0のキューでは、待機中のConsumerがいる場合のみ成功する。
    pub fn try_push(&self, item: T) -> Result<(), QueueError<T>> {
        let mut state = self.lock();
        if state.closed {
            return Err(QueueError::Closed(item));
        }

        let has_room = if self.shared.capacity == 0 {
            state.parked > state.buffer.len()
        } else {
            state.buffer.len() < self.shared.capacity
        };
        if !has_room {
            return Err(QueueError::Full(item));
        }

        state.buffer.push_back(item);
        state.pushed += 1;
        drop(state);
        self.shared.not_empty.notify_waiters();
        Ok(())
    }

    /// 要素を取り出す。`None` はクローズ済みかつ空（枯渇）を意味する
    pub async fn pop(&self) -> Option<T> {
        self.pop_indexed().await.map(|(_, item)| item)
    }

    /// 要素とそのFIFO上の位置（0始まり、投入順）を取り出す
    pub async fn pop_indexed(&self) -> Option<(u64, T)> {
        loop {
            let mut notified = pin!(self.shared.not_empty.notified());
            notified.as_mut().enable();

            let _parked = {
                let mut state = self.lock();
                if let Some(item) = state.buffer.pop_front() {
                    let index = state.taken;
                    state.taken += 1;
                    drop(state);
                    self.shared.not_full.notify_waiters();
                    return Some((index, item));
                }
                if state.closed {
                    return None;
                }
                state.parked += 1;
                ParkedGuard { queue: self }
            };

            notified.await;
        }
    }

    /// 待機せずに取り出す
    pub fn try_pop(&self) -> Option<T> {
        let mut state = self.lock();
        let item = state.buffer.pop_front()?;
        state.taken += 1;
        drop(state);
        self.shared.not_full.notify_waiters();
        Some(item)
    }

    /// キューをクローズする。2回目以降は何もせず `false` を返す
    pub fn close(&self) -> bool {
        let mut state = self.lock();
        if state.closed {
            return false;
        }
        state.closed = true;
        let remaining = state.buffer.len();
        drop(state);

        debug!(capacity = self.shared.capacity, remaining, "queue closed");
        self.shared.not_empty.notify_waiters();
        self.shared.not_full.notify_waiters();
        true
    }

    /// 待機せずに、現在バッファにある要素を全て取り出す
    pub fn collect_available(&self) -> Vec<T> {
        let mut state = self.lock();
        let items: Vec<T> = state.buffer.drain(..).collect();
        state.taken += items.len() as u64;
        drop(state);
        if !items.is_empty() {
            self.shared.not_full.notify_waiters();
        }
        items
    }

    /// 枯渇するまで全要素を取り出す
    pub async fn collect(&self) -> Vec<T> {
        let mut items = Vec::new();
        while let Some(item) = self.pop().await {
            items.push(item);
        }
        items
    }
}

impl<T: Send + 'static> TaskQueue<T> {
    /// `futures::Stream` として消費する
    pub fn into_stream(self) -> impl Stream<Item = T> {
        futures::stream::unfold(self, |queue| async move {
            let item = queue.pop().await?;
            Some((item, queue))
        })
    }
}
