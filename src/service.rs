//! Transport loop and store actor.
//!
//! The store is owned by one blocking task; every request reaches it through an
//! mpsc queue and gets its envelope back on a oneshot. With a latency configured,
//! each request first waits in its own task, and `request.cancel` can abort it
//! there. Once a request has left the wait it is committed and cannot be cancelled.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, oneshot};
use tokio::task::{AbortHandle, JoinHandle, JoinSet};

use crate::ipc::{self, AppState, Request};

struct Job {
    req: Request,
    reply: oneshot::Sender<Value>,
}

#[derive(Clone)]
pub struct StoreHandle {
    tx: mpsc::Sender<Job>,
}

impl StoreHandle {
    pub async fn call(&self, req: Request) -> Value {
        let id = req.id.clone();
        let (reply, rx) = oneshot::channel();
        if self.tx.send(Job { req, reply }).await.is_err() {
            return ipc::err(&id, "storage_failed", "store is not running", None);
        }
        rx.await
            .unwrap_or_else(|_| ipc::err(&id, "storage_failed", "store dropped the request", None))
    }
}

/// Moves `state` onto a dedicated blocking task; it is the only writer.
pub fn spawn_store_actor(mut state: AppState) -> (StoreHandle, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<Job>(64);
    let task = tokio::task::spawn_blocking(move || {
        while let Some(job) = rx.blocking_recv() {
            let resp = ipc::handle_request(&mut state, job.req);
            let _ = job.reply.send(resp);
        }
        tracing::debug!("store actor stopped");
    });
    (StoreHandle { tx }, task)
}

type Pending = Arc<Mutex<HashMap<String, AbortHandle>>>;

/// Takes the request out of the pending map. Whoever removes it owns its outcome.
fn claim(pending: &Pending, id: &str) -> Option<AbortHandle> {
    pending
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .remove(id)
}

/// Lock for registering a new request. A poisoned table is reset and the
/// caller gets `None`, so only the request being registered is refused.
fn lock_pending(pending: &Pending) -> Option<MutexGuard<'_, HashMap<String, AbortHandle>>> {
    match pending.lock() {
        Ok(map) => Some(map),
        Err(poisoned) => {
            drop(poisoned);
            pending.clear_poison();
            tracing::warn!("pending request table was poisoned; reset");
            None
        }
    }
}

fn handle_cancel(
    pending: &Pending,
    req: &Request,
    out: &mpsc::UnboundedSender<Value>,
) -> Value {
    let Some(target) = req.params.get("requestId").and_then(|v| v.as_str()) else {
        return ipc::err(&req.id, "bad_params", "missing params.requestId", None);
    };
    match claim(pending, target) {
        Some(handle) => {
            handle.abort();
            tracing::info!(request = %target, "request cancelled");
            let _ = out.send(ipc::err(target, "cancelled", "request cancelled", None));
            json!({ "id": req.id, "ok": true, "result": { "cancelled": true } })
        }
        None => json!({ "id": req.id, "ok": true, "result": { "cancelled": false } }),
    }
}

pub async fn serve<R, W>(
    input: R,
    output: W,
    store: StoreHandle,
    latency: Duration,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Value>();
    let writer = tokio::spawn(async move {
        let mut output = output;
        while let Some(v) = out_rx.recv().await {
            let line = serde_json::to_string(&v).unwrap_or_else(|_| "{\"ok\":false}".to_string());
            output.write_all(line.as_bytes()).await?;
            output.write_all(b"\n").await?;
            output.flush().await?;
        }
        anyhow::Ok(())
    });

    let pending: Pending = Arc::default();
    let mut delayed = JoinSet::new();
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await? {
        while delayed.try_join_next().is_some() {}

        if line.trim().is_empty() {
            continue;
        }

        let req: Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // No id to answer to.
                let _ = out_tx.send(json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                }));
                continue;
            }
        };

        if req.method == "request.cancel" {
            let resp = handle_cancel(&pending, &req, &out_tx);
            let _ = out_tx.send(resp);
            continue;
        }

        if latency.is_zero() {
            let resp = store.call(req).await;
            let _ = out_tx.send(resp);
            continue;
        }

        let Some(mut map) = lock_pending(&pending) else {
            let _ = out_tx.send(ipc::err(
                &req.id,
                "storage_failed",
                "pending request table was reset; retry the request",
                None,
            ));
            continue;
        };
        if map.contains_key(&req.id) {
            let _ = out_tx.send(ipc::err(
                &req.id,
                "bad_params",
                format!("request id already in flight: {}", req.id),
                None,
            ));
            continue;
        }
        let id = req.id.clone();
        let task_pending = Arc::clone(&pending);
        let task_store = store.clone();
        let task_out = out_tx.clone();
        // The map stays locked until the handle is registered, so the task cannot
        // wake and look itself up before it is there.
        let handle = delayed.spawn(async move {
            tokio::time::sleep(latency).await;
            if claim(&task_pending, &req.id).is_none() {
                return;
            }
            let resp = task_store.call(req).await;
            let _ = task_out.send(resp);
        });
        map.insert(id, handle);
    }

    // EOF: let waiting requests finish, then flush.
    while delayed.join_next().await.is_some() {}
    drop(out_tx);
    writer.await??;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppSettings;
    use crate::seed::{demo_store, SeedOptions};
    use tokio::io::BufReader;

    fn state() -> AppState {
        AppState::new(demo_store(SeedOptions::default()), AppSettings::default())
    }

    async fn run(input: &str, latency_ms: u64) -> Vec<Value> {
        let (store, actor) = spawn_store_actor(state());
        let (mut client, server) = tokio::io::duplex(64 * 1024);

        let input = BufReader::new(std::io::Cursor::new(input.as_bytes().to_vec()));
        serve(input, server, store, Duration::from_millis(latency_ms))
            .await
            .expect("serve");
        actor.await.expect("actor");

        let mut out = String::new();
        tokio::io::AsyncReadExt::read_to_string(&mut client, &mut out)
            .await
            .expect("read output");
        out.lines()
            .map(|l| serde_json::from_str(l).expect("json line"))
            .collect()
    }

    #[tokio::test]
    async fn inline_dispatch_answers_in_order() {
        let input = concat!(
            "{\"id\":\"1\",\"method\":\"health\",\"params\":{}}\n",
            "not json\n",
            "{\"id\":\"2\",\"method\":\"auth.login\",\"params\":{\"username\":\"guru\",\"password\":\"guru123\"}}\n",
            "{\"id\":\"3\",\"method\":\"request.cancel\",\"params\":{\"requestId\":\"2\"}}\n",
        );
        let out = run(input, 0).await;
        assert_eq!(out.len(), 4);
        assert_eq!(out[0]["id"], "1");
        assert_eq!(out[1]["error"]["code"], "bad_json");
        assert_eq!(out[2]["result"]["redirect"], "/guru/dashboard");
        assert_eq!(out[3]["result"]["cancelled"], false);
    }

    #[tokio::test]
    async fn cancelled_request_never_reaches_the_store() {
        let input = concat!(
            "{\"id\":\"a\",\"method\":\"auth.login\",\"params\":{\"username\":\"admin\",\"password\":\"admin123\"}}\n",
            "{\"id\":\"c\",\"method\":\"request.cancel\",\"params\":{\"requestId\":\"a\"}}\n",
            "{\"id\":\"s\",\"method\":\"auth.session\",\"params\":{}}\n",
        );
        let out = run(input, 200).await;
        let by_id = |id: &str| out.iter().find(|v| v["id"] == id).cloned().expect(id);
        assert_eq!(by_id("a")["error"]["code"], "cancelled");
        assert_eq!(by_id("c")["result"]["cancelled"], true);
        assert!(by_id("s")["result"]["user"].is_null());
        assert_eq!(out.len(), 3);
    }

    #[tokio::test]
    async fn stopped_store_answers_storage_failed() {
        let (tx, rx) = mpsc::channel::<Job>(1);
        drop(rx);
        let store = StoreHandle { tx };
        let resp = store
            .call(Request {
                id: "9".into(),
                method: "health".into(),
                params: Value::Null,
            })
            .await;
        assert_eq!(resp["id"], "9");
        assert_eq!(resp["error"]["code"], "storage_failed");
    }

    #[test]
    fn poisoned_pending_table_refuses_once_then_recovers() {
        let pending: Pending = Arc::default();
        let poisoner = Arc::clone(&pending);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison the table");
        })
        .join();
        assert!(pending.is_poisoned());

        assert!(lock_pending(&pending).is_none());
        assert!(!pending.is_poisoned());
        assert!(lock_pending(&pending).is_some());
        assert!(claim(&pending, "missing").is_none());
    }

    #[tokio::test]
    async fn duplicate_in_flight_id_is_rejected() {
        let input = concat!(
            "{\"id\":\"x\",\"method\":\"health\",\"params\":{}}\n",
            "{\"id\":\"x\",\"method\":\"health\",\"params\":{}}\n",
        );
        let out = run(input, 100).await;
        assert_eq!(out.len(), 2);
        assert_eq!(out[0]["error"]["code"], "bad_params");
        assert_eq!(out[1]["ok"], true);
    }
}
