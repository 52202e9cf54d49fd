//! In-process stand-in for the element, used by tests.
//!
//! Answers every `ue_get` request with a frame whose byte counter grows by
//! a fixed step, optionally closing the connection after a number of replies.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;

#[derive(Debug, Clone)]
pub struct Behaviour {
    /// Close the connection after this many replies.
    pub close_after: Option<u64>,
    pub bytes_step: u64,
    pub dl_bitrate: u64,
}

impl Default for Behaviour {
    fn default() -> Self {
        Self {
            close_after: None,
            bytes_step: 1_000_000,
            dl_bitrate: 8_000_000,
        }
    }
}

/// Start an element on an ephemeral port and return its URL.
pub async fn spawn(behaviour: Behaviour) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/", listener.local_addr().unwrap());
    tokio::spawn(serve(listener, behaviour));
    url
}

/// Start an element on a specific address.
pub async fn spawn_at(addr: SocketAddr, behaviour: Behaviour) {
    let listener = TcpListener::bind(addr).await.unwrap();
    tokio::spawn(serve(listener, behaviour));
}

/// An address nothing is listening on (at the time of the call).
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

async fn serve(listener: TcpListener, behaviour: Behaviour) {
    // Shared across connections so the counter keeps growing after a reconnect
    let replies = Arc::new(AtomicU64::new(0));
    while let Ok((stream, _)) = listener.accept().await {
        tokio::spawn(handle(stream, behaviour.clone(), replies.clone()));
    }
}

async fn handle(stream: TcpStream, behaviour: Behaviour, replies: Arc<AtomicU64>) {
    let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else {
        return;
    };
    let mut sent_here = 0u64;

    while let Some(Ok(msg)) = ws.next().await {
        let Message::Text(text) = msg else {
            continue;
        };
        let Ok(request) = serde_json::from_str::<serde_json::Value>(text.as_str()) else {
            continue;
        };
        if request["message"] != "ue_get" {
            continue;
        }

        let n = replies.fetch_add(1, Ordering::SeqCst) + 1;
        let frame = serde_json::json!({
            "message": "ue_get",
            "message_id": request["message_id"],
            "ue_list": [{
                "cells": [{
                    "dl_bitrate": behaviour.dl_bitrate,
                    "epre": -80.0,
                    "cqi": 15,
                    "dl_mcs": 28
                }],
                "erab_list": [{ "dl_total_bytes": n * behaviour.bytes_step }]
            }]
        });
        if ws.send(Message::text(frame.to_string())).await.is_err() {
            return;
        }

        sent_here += 1;
        if behaviour.close_after.is_some_and(|limit| sent_here >= limit) {
            let _ = ws.close(None).await;
            return;
        }
    }
}
