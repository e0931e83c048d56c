// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use crate::Handshake;
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use wssign_core::Result;

/// Receiving half of the handshake completion.
pub type HandshakeCompletion = oneshot::Receiver<Result<()>>;

/// WebSocketHandler is the `ws-handler` stage of a pipeline.
///
/// It carries the handshake used to build the upgrade request and the
/// sending half of the completion. The first call to
/// [`WebSocketHandler::complete`] wins, later calls are ignored.
#[derive(Clone)]
pub struct WebSocketHandler {
    handshaker: Arc<dyn Handshake>,
    completion: Arc<Mutex<Option<oneshot::Sender<Result<()>>>>>,
}

impl Debug for WebSocketHandler {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSocketHandler")
            .field("handshaker", &self.handshaker)
            .field("completed", &self.is_completed())
            .finish()
    }
}

impl WebSocketHandler {
    /// Create a handler and the completion that waits for it.
    pub fn new(handshaker: Arc<dyn Handshake>) -> (Self, HandshakeCompletion) {
        let (tx, rx) = oneshot::channel();
        let handler = Self {
            handshaker,
            completion: Arc::new(Mutex::new(Some(tx))),
        };
        (handler, rx)
    }

    /// The handshake of this connection.
    pub fn handshaker(&self) -> Arc<dyn Handshake> {
        self.handshaker.clone()
    }

    /// Fulfil the completion with the handshake outcome.
    ///
    /// Returns `false` if it was already completed or nobody waits anymore.
    pub fn complete(&self, result: Result<()>) -> bool {
        let tx = self
            .completion
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();

        match tx {
            Some(tx) => tx.send(result).is_ok(),
            None => false,
        }
    }

    /// Whether the completion was already fulfilled.
    pub fn is_completed(&self) -> bool {
        self.completion
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ClientHandshaker, WebSocketVersion};
    use http::Uri;
    use wssign_core::{Error, ErrorKind};

    fn handler() -> (WebSocketHandler, HandshakeCompletion) {
        WebSocketHandler::new(Arc::new(ClientHandshaker::new(
            Uri::from_static("ws://localhost:8182/gremlin"),
            WebSocketVersion::V13,
        )))
    }

    #[tokio::test]
    async fn test_complete_at_most_once() {
        let (handler, rx) = handler();
        let cloned = handler.clone();

        assert!(handler.complete(Err(Error::handshake_failed("refused"))));
        assert!(cloned.is_completed());
        assert!(!cloned.complete(Ok(())));

        let err = rx.await.unwrap().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::HandshakeFailed);
    }

    #[tokio::test]
    async fn test_dropped_handler_closes_completion() {
        let (handler, rx) = handler();
        drop(handler);

        assert!(rx.await.is_err());
    }
}
