//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// This module implements a thread worker that owns a MatchingEngine and applies requests
// one at a time. It is the single writer of the book: callers submit requests through a
// bounded queue and await the reply, and the worker assigns arrival sequences itself so
// time priority follows queue order.
//
// | Component           | Description                                                 |
// |---------------------|-------------------------------------------------------------|
// | EngineWorker        | Worker thread owning the engine                             |
// | EngineClient        | Cloneable async handle submitting requests                  |
// | EngineCommand       | Requests sent to the worker                                 |
//
//--------------------------------------------------------------------------------------------------
// ENUMS
//--------------------------------------------------------------------------------------------------
// | Name               | Description                                       | Variants            |
// |--------------------|---------------------------------------------------|---------------------|
// | EngineCommand      | Requests sent to worker                           | PlaceLimit          |
// |                    |                                                   | PlaceMarket         |
// |                    |                                                   | Cancel              |
// |                    |                                                   | GetDepth            |
// |                    |                                                   | Shutdown            |
//--------------------------------------------------------------------------------------------------

use std::thread::{self, JoinHandle};

use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::sync::oneshot;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::domain::models::types::{Match, Order, OrderId, Price, Quantity, SequenceGenerator, Side};
use crate::domain::services::matching_engine::matching_engine::{MatchingEngine, Placement};
use crate::domain::services::matching_engine::{MatchingError, MatchingResult};
use crate::domain::services::orderbook::depth::DepthSnapshot;

/// Requests that can be sent to the EngineWorker
#[derive(Debug)]
enum EngineCommand {
    PlaceLimit {
        side: Side,
        size: Quantity,
        price: Price,
        response_tx: oneshot::Sender<MatchingResult<Placement>>,
    },

    PlaceMarket {
        side: Side,
        size: Quantity,
        response_tx: oneshot::Sender<MatchingResult<Vec<Match>>>,
    },

    Cancel {
        order_id: OrderId,
        response_tx: oneshot::Sender<MatchingResult<Order>>,
    },

    GetDepth {
        limit: usize,
        response_tx: oneshot::Sender<DepthSnapshot>,
    },

    /// Stop the worker after the requests queued before it
    Shutdown,
}

/// Worker thread that owns the matching engine
pub struct EngineWorker {
    engine: MatchingEngine,
    sequence: SequenceGenerator,
    queue_capacity: usize,
}

impl EngineWorker {
    /// Creates a worker around an existing engine.
    ///
    /// # Arguments
    /// * `engine` - The engine the worker takes ownership of
    /// * `queue_capacity` - Maximum number of requests waiting in the queue
    pub fn new(engine: MatchingEngine, queue_capacity: usize) -> Self {
        Self {
            engine,
            sequence: SequenceGenerator::new(),
            queue_capacity: queue_capacity.max(1),
        }
    }

    /// Creates a worker and its engine from the configuration.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(MatchingEngine::with_config(config), config.worker_queue)
    }

    /// Starts the worker thread and returns a client to interact with it.
    ///
    /// The join handle yields the engine back once the worker has shut down,
    /// either on request or because every client was dropped.
    pub fn start(self) -> (EngineClient, JoinHandle<MatchingEngine>) {
        let (command_tx, command_rx) = mpsc::channel(self.queue_capacity);
        let client = EngineClient { command_tx };

        let handle = thread::spawn(move || self.run(command_rx));

        (client, handle)
    }

    fn run(mut self, mut command_rx: Receiver<EngineCommand>) -> MatchingEngine {
        info!(instrument_id = %self.engine.instrument_id(), "matching engine worker started");

        while let Some(cmd) = command_rx.blocking_recv() {
            if !self.handle_command(cmd) {
                break;
            }
        }

        info!(instrument_id = %self.engine.instrument_id(), "matching engine worker stopped");
        self.engine
    }

    /// Applies one command. Returns false once the worker should stop.
    fn handle_command(&mut self, cmd: EngineCommand) -> bool {
        match cmd {
            EngineCommand::PlaceLimit { side, size, price, response_tx } => {
                let order = Order::with_sequence(side, size, self.sequence.next());
                let result = self.engine.place_limit_order(price, order);
                let _ = response_tx.send(result);
            }

            EngineCommand::PlaceMarket { side, size, response_tx } => {
                let mut order = Order::with_sequence(side, size, self.sequence.next());
                let result = self.engine.place_market_order(&mut order);
                let _ = response_tx.send(result);
            }

            EngineCommand::Cancel { order_id, response_tx } => {
                let result = self.engine.cancel_order(order_id);
                let _ = response_tx.send(result);
            }

            EngineCommand::GetDepth { limit, response_tx } => {
                let _ = response_tx.send(self.engine.depth(limit));
            }

            EngineCommand::Shutdown => {
                debug!(instrument_id = %self.engine.instrument_id(), "shutdown requested");
                return false;
            }
        }
        true
    }
}

/// Client interface to interact with the EngineWorker
#[derive(Debug, Clone)]
pub struct EngineClient {
    command_tx: Sender<EngineCommand>,
}

impl EngineClient {
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> EngineCommand,
    ) -> MatchingResult<T> {
        let (response_tx, response_rx) = oneshot::channel();

        self.command_tx
            .send(build(response_tx))
            .await
            .map_err(|_| MatchingError::WorkerUnavailable("request channel closed".to_string()))?;

        response_rx
            .await
            .map_err(|_| MatchingError::WorkerUnavailable("worker dropped the request".to_string()))
    }

    /// Places a limit order; the worker stamps its arrival sequence.
    pub async fn place_limit_order(&self, side: Side, size: Quantity, price: Price) -> MatchingResult<Placement> {
        self.request(|response_tx| EngineCommand::PlaceLimit {
            side,
            size,
            price,
            response_tx,
        })
        .await?
    }

    /// Executes a market order.
    pub async fn place_market_order(&self, side: Side, size: Quantity) -> MatchingResult<Vec<Match>> {
        self.request(|response_tx| EngineCommand::PlaceMarket {
            side,
            size,
            response_tx,
        })
        .await?
    }

    /// Cancels a resting order.
    pub async fn cancel_order(&self, order_id: OrderId) -> MatchingResult<Order> {
        self.request(|response_tx| EngineCommand::Cancel { order_id, response_tx })
            .await?
    }

    /// Gets the current market depth.
    pub async fn get_depth(&self, limit: usize) -> MatchingResult<DepthSnapshot> {
        self.request(|response_tx| EngineCommand::GetDepth { limit, response_tx })
            .await
    }

    /// Shuts down the worker thread after the requests already queued.
    pub async fn shutdown(&self) -> MatchingResult<()> {
        self.command_tx
            .send(EngineCommand::Shutdown)
            .await
            .map_err(|_| MatchingError::WorkerUnavailable("request channel closed".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn start_worker() -> (EngineClient, JoinHandle<MatchingEngine>) {
        EngineWorker::new(MatchingEngine::new(Uuid::new_v4()), 16).start()
    }

    #[tokio::test]
    async fn test_place_and_depth() {
        let (client, handle) = start_worker();

        client.place_limit_order(Side::Bid, 5, 100).await.expect("bid placed");
        client.place_limit_order(Side::Ask, 3, 101).await.expect("ask placed");

        let depth = client.get_depth(10).await.expect("depth");
        assert_eq!(depth.best_bid(), Some(100));
        assert_eq!(depth.best_ask(), Some(101));

        client.shutdown().await.expect("shutdown sent");
        let engine = handle.join().expect("worker exits cleanly");
        assert_eq!(engine.order_book().resting_order_count(), 2);
    }

    #[tokio::test]
    async fn test_sequences_follow_queue_order() {
        let (client, _handle) = start_worker();

        let first = client.place_limit_order(Side::Ask, 1, 100).await.unwrap();
        let second = client.place_limit_order(Side::Ask, 1, 100).await.unwrap();
        assert_eq!(first.order_id, OrderId(1));
        assert_eq!(second.order_id, OrderId(2));

        let matches = client.place_market_order(Side::Bid, 1).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].ask_order_id, first.order_id);
        assert_eq!(matches[0].bid_order_id, OrderId(3));

        client.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_errors_are_returned_to_caller() {
        let (client, _handle) = start_worker();

        let err = client.place_market_order(Side::Bid, 1).await.unwrap_err();
        assert_eq!(err, MatchingError::InsufficientLiquidity { requested: 1, available: 0 });

        let err = client.cancel_order(OrderId(42)).await.unwrap_err();
        assert_eq!(err, MatchingError::OrderNotResting(OrderId(42)));

        // The worker keeps serving after rejections.
        let placement = client.place_limit_order(Side::Bid, 2, 50).await.unwrap();
        let canceled = client.cancel_order(placement.order_id).await.unwrap();
        assert_eq!(canceled.size, 2);

        client.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_drains_earlier_requests() {
        let (client, handle) = start_worker();

        let pending: Vec<_> = (0..5)
            .map(|_| {
                let client = client.clone();
                tokio::spawn(async move { client.place_limit_order(Side::Bid, 1, 90).await })
            })
            .collect();
        for task in pending {
            task.await.unwrap().unwrap();
        }
        client.shutdown().await.unwrap();

        let engine = tokio::task::spawn_blocking(move || handle.join().unwrap())
            .await
            .unwrap();
        assert_eq!(engine.order_book().volume_at_price(Side::Bid, 90), Some(5));

        let err = client.place_limit_order(Side::Bid, 1, 90).await.unwrap_err();
        assert!(matches!(err, MatchingError::WorkerUnavailable(_)));
    }

    #[tokio::test]
    async fn test_client_after_shutdown() {
        let (client, handle) = start_worker();
        client.shutdown().await.unwrap();
        handle.join().unwrap();

        let err = client.get_depth(1).await.unwrap_err();
        assert!(matches!(err, MatchingError::WorkerUnavailable(_)));
    }

    #[test]
    fn test_blocking_caller() {
        let (client, handle) = start_worker();

        tokio_test::block_on(async {
            client.place_limit_order(Side::Ask, 4, 10).await.unwrap();
            let matches = client.place_market_order(Side::Bid, 4).await.unwrap();
            assert_eq!(matches[0].price, 10);
        });

        drop(client);
        let engine = handle.join().unwrap();
        assert!(engine.order_book().is_empty());
    }
}
