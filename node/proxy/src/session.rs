use crate::{error::SessionError, wallet};

use poolproxy_node_messages::{methods, Request, Response, StratumCodec, WorkTuple};
use poolproxy_node_sender::{Sender, SessionId};
use poolproxy_node_store::{NewBlock, NewShare, ShareType, Store, StoreError};
use poolproxy_node_upstream::UpstreamClient;
use poolproxy_node_verifier::{difficulty, seal, Verifier};

use futures_util::{SinkExt, StreamExt};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::{
    net::TcpStream,
    sync::{mpsc, Mutex, OwnedSemaphorePermit},
};
use tokio_util::codec::Framed;

/// Shared, cloneable handles every session needs; constructed once by the coordinator.
#[derive(Clone)]
pub struct SessionDeps {
    pub sender: Arc<Sender>,
    pub store: Arc<Mutex<Store>>,
    pub upstream: UpstreamClient,
    pub verifier: Arc<Verifier>,
    pub pool_target: String,
    pub timeout: Duration,
}

/// Per-connection authenticated identity, set on a successful `eth_submitLogin`.
#[derive(Clone, Debug)]
struct Identity {
    wallet: String,
    worker: String,
}

/// Drives one miner TCP connection end to end: reads newline-delimited JSON-RPC requests,
/// dispatches them, and relays work-push notifications once the session has logged in and
/// attached to the Sender. Returns when the socket closes, the idle deadline expires, or a
/// write fails.
pub async fn run_session(
    socket: TcpStream,
    peer_addr: SocketAddr,
    _permit: OwnedSemaphorePermit,
    session_id: SessionId,
    deps: SessionDeps,
) {
    metrics::increment_gauge!(poolproxy_node_metrics::sessions::CONNECTED, 1.0);
    let mut framed = Framed::new(socket, StratumCodec::default());
    let mut identity: Option<Identity> = None;
    let mut push_rx: Option<mpsc::Receiver<WorkTuple>> = None;

    loop {
        let push_next = async {
            match push_rx.as_mut() {
                Some(rx) => rx.recv().await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;

            pushed = push_next => {
                match pushed {
                    Some(tuple) => {
                        if framed.send(Response::work_push(&tuple)).await.is_err() {
                            tracing::debug!(%peer_addr, "write failed delivering work push");
                            break;
                        }
                    }
                    None => {
                        tracing::debug!(%peer_addr, "sender dropped this session's push channel");
                        break;
                    }
                }
            }

            line = tokio::time::timeout(deps.timeout, framed.next()) => {
                let Ok(line) = line else {
                    tracing::debug!(%peer_addr, "idle timeout exceeded");
                    break;
                };
                let Some(line) = line else {
                    tracing::debug!(%peer_addr, "client disconnected");
                    break;
                };
                let request = match line {
                    Ok(request) => request,
                    Err(error) => {
                        tracing::debug!(%peer_addr, %error, "closing session on malformed/flooded input");
                        break;
                    }
                };

                let id = request.id;
                let (response, close) = dispatch(&request, peer_addr, session_id, &deps, &mut identity, &mut push_rx).await;
                let response = response.unwrap_or_else(|| Response::ok(id, serde_json::Value::Null));
                if framed.send(response).await.is_err() {
                    break;
                }
                if close {
                    break;
                }
            }
        }
    }

    if identity.is_some() {
        deps.sender.detach(session_id);
    }
    metrics::decrement_gauge!(poolproxy_node_metrics::sessions::CONNECTED, 1.0);
}

/// Returns `(response, should_close)`. `response` is `None` only when the caller should
/// synthesize a default — it's always `Some` in practice, kept as an option to mirror the
/// shape of a fallible dispatch without forcing every branch to build an error `Response`.
async fn dispatch(
    request: &Request,
    peer_addr: SocketAddr,
    session_id: SessionId,
    deps: &SessionDeps,
    identity: &mut Option<Identity>,
    push_rx: &mut Option<mpsc::Receiver<WorkTuple>>,
) -> (Option<Response>, bool) {
    match request.method.as_str() {
        methods::SUBMIT_LOGIN => {
            let result = handle_submit_login(request, peer_addr, session_id, deps, identity, push_rx).await;
            match result {
                Ok(()) => (Some(Response::ok(request.id, true)), false),
                Err(error) => (Some(Response::err(request.id, error.to_string())), false),
            }
        }
        methods::GET_WORK => {
            let work = deps
                .sender
                .last_work()
                .map(|tuple| serde_json::Value::Array(tuple.iter().cloned().map(serde_json::Value::String).collect()));
            (Some(Response { id: request.id, jsonrpc: Request::VERSION.to_owned(), result: work, error: None }), false)
        }
        methods::SUBMIT_HASHRATE => {
            tracing::trace!(%peer_addr, "claimed hashrate (not stored)");
            (Some(Response::ok(request.id, true)), false)
        }
        methods::SUBMIT_WORK => {
            let identity = identity.clone();
            let result = handle_submit_work(request, identity.as_ref(), deps).await;
            match result {
                Ok(()) => (Some(Response::ok(request.id, true)), false),
                Err(error) => (Some(Response::err(request.id, error.to_string())), false),
            }
        }
        _ => (Some(Response::err(request.id, SessionError::MethodNotFound.to_string())), false),
    }
}

async fn handle_submit_login(
    request: &Request,
    peer_addr: SocketAddr,
    session_id: SessionId,
    deps: &SessionDeps,
    identity: &mut Option<Identity>,
    push_rx: &mut Option<mpsc::Receiver<WorkTuple>>,
) -> Result<(), SessionError> {
    let params = request.string_params().ok_or_else(|| SessionError::Malformed(format!("{:?}", request.params)))?;
    let raw = params.first().ok_or_else(|| SessionError::Malformed("missing wallet parameter".to_owned()))?;

    let (wallet, worker) = wallet::split_wallet_worker(raw, request.worker.as_deref());
    if !wallet::is_valid_wallet(&wallet) {
        return Err(SessionError::AuthInvalid(wallet));
    }
    let wallet = wallet.to_lowercase();

    {
        let mut store = deps.store.lock().await;
        store.miner_login(&wallet, &worker).await.map_err(|error| SessionError::StorageFailure(error.to_string()))?;
    }

    tracing::info!(%peer_addr, %wallet, %worker, "miner authenticated");
    *identity = Some(Identity { wallet, worker });
    *push_rx = Some(deps.sender.attach(session_id));
    Ok(())
}

async fn handle_submit_work(request: &Request, identity: Option<&Identity>, deps: &SessionDeps) -> Result<(), SessionError> {
    let Some(identity) = identity else {
        return Err(SessionError::NotAuthenticated);
    };

    let params = request.string_params().ok_or_else(|| SessionError::Malformed(format!("{:?}", request.params)))?;
    if params.len() != 3 {
        return Err(SessionError::Malformed("expected [nonce, headerHash, mixDigest]".to_owned()));
    }
    let (nonce_hex, header_hash, mix_hex) = (&params[0], &params[1], &params[2]);

    let full_work = deps.sender.by_header(header_hash).ok_or(SessionError::WorkUnknown)?;

    let block_number = hex_block_number(&full_work[3]);
    let is_stale = match (block_number, deps.sender.latest_block_number()) {
        (Some(submitted), Some(latest)) => submitted != latest,
        _ => false,
    };
    let share_type_hint = if is_stale { ShareType::Stale } else { ShareType::Valid };

    let pool_difficulty = difficulty::target_to_difficulty(&deps.pool_target);
    let boundary = seal::difficulty_to_boundary(to_u256(&pool_difficulty));

    let nonce = seal::decode_nonce(nonce_hex).map_err(|_| SessionError::Malformed("invalid nonce".to_owned()))?;
    let header = seal::decode_hash(header_hash).map_err(|_| SessionError::Malformed("invalid headerHash".to_owned()))?;
    let mix = seal::decode_hash(mix_hex).map_err(|_| SessionError::Malformed("invalid mixDigest".to_owned()))?;
    let block_number_u64 = block_number.unwrap_or(0);

    let pow = format!("{nonce_hex}:{header_hash}:{mix_hex}");
    // `full_work` carries the pool-target substitution from `by_header`; the network
    // difficulty needs the un-substituted target, so look it up again without it.
    let raw_work = deps.sender.by_header_raw(header_hash).unwrap_or_else(|| full_work.clone());
    let network_difficulty = difficulty::target_to_difficulty(&raw_work[2]);

    let new_share = |share_type: ShareType| NewShare {
        block: block_number_u64 as i64,
        difficulty: big_to_f64(&pool_difficulty),
        network_difficulty: big_to_f64(&network_difficulty),
        miner: identity.wallet.clone(),
        worker: identity.worker.clone(),
        pow: pow.clone(),
        share_type,
    };

    if !deps.verifier.verify(block_number_u64, header, nonce, mix, boundary) {
        persist_share(deps, new_share(ShareType::Invalid)).await;
        metrics::increment_counter!(poolproxy_node_metrics::shares::INVALID);
        return Err(SessionError::PoWInvalid);
    }

    match deps.upstream.submit_work(nonce_hex, header_hash, mix_hex).await {
        Err(error) => {
            persist_share(deps, new_share(share_type_hint)).await;
            return Err(SessionError::UpstreamTransport(error.to_string()));
        }
        Ok(false) => {
            persist_share(deps, new_share(share_type_hint)).await;
            return Err(SessionError::UpstreamRejected);
        }
        Ok(true) => {}
    }

    metrics::increment_counter!(match share_type_hint {
        ShareType::Valid => poolproxy_node_metrics::shares::VALID,
        ShareType::Stale => poolproxy_node_metrics::shares::STALE,
        ShareType::Invalid => poolproxy_node_metrics::shares::INVALID,
    });

    let share = new_share(share_type_hint);
    let new_block = NewBlock {
        block: block_number_u64 as i64,
        network_difficulty: big_to_f64(&network_difficulty),
        miner: identity.wallet.clone(),
        worker: identity.worker.clone(),
        nonce: nonce_hex.clone(),
    };

    let mut store = deps.store.lock().await;
    match store.write_block(&share, &new_block).await {
        Ok(()) => {
            metrics::increment_gauge!(poolproxy_node_metrics::blocks::PENDING, 1.0);
            Ok(())
        }
        Err(StoreError::ReplayedShare) => Err(SessionError::ReplayedShare),
        Err(error) => Err(SessionError::StorageFailure(error.to_string())),
    }
}

async fn persist_share(deps: &SessionDeps, share: NewShare) {
    let mut store = deps.store.lock().await;
    if let Err(error) = store.write_share(&share).await {
        tracing::warn!(%error, "failed to persist share");
    }
}

fn hex_block_number(hex: &str) -> Option<u64> {
    u64::from_str_radix(hex.trim_start_matches("0x"), 16).ok()
}

fn to_u256(value: &num_bigint::BigUint) -> ethereum_types::U256 {
    let bytes = value.to_bytes_be();
    ethereum_types::U256::from_big_endian(&{
        let mut padded = [0u8; 32];
        let start = 32usize.saturating_sub(bytes.len());
        padded[start..].copy_from_slice(&bytes[bytes.len().saturating_sub(32)..]);
        padded
    })
}

fn big_to_f64(value: &num_bigint::BigUint) -> f64 {
    value.to_string().parse::<f64>().unwrap_or(f64::MAX)
}
