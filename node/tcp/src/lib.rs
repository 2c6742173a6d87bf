use std::{future::Future, io, net::SocketAddr, sync::Arc, time::Duration};

use tokio::{
    net::{TcpListener, TcpStream},
    sync::{Notify, OwnedSemaphorePermit, Semaphore},
};

/// Binds a TCP listener, enables keepalive on accepted sockets, and caps the number of
/// concurrently accepted connections with a counting semaphore. Excess accepts park on
/// the semaphore until a slot frees up rather than being rejected outright.
pub struct Acceptor {
    listener: TcpListener,
    permits: Arc<Semaphore>,
    quit: Arc<Notify>,
}

impl Acceptor {
    pub async fn bind(addr: SocketAddr, max_connections: usize) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, permits: Arc::new(Semaphore::new(max_connections)), quit: Arc::new(Notify::new()) })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// A handle that, when notified, stops the accept loop. Already-accepted sessions are
    /// unaffected — the caller is expected to drive their own shutdown of those.
    pub fn quit_handle(&self) -> Arc<Notify> {
        self.quit.clone()
    }

    /// Runs the accept loop until the quit handle is notified. `handler` is spawned as its
    /// own task per accepted connection; it receives the socket, peer address, and a permit
    /// that must be held for the lifetime of the session to keep it counted against
    /// `max_connections`.
    pub async fn run<F, Fut>(self, handler: F)
    where
        F: Fn(TcpStream, SocketAddr, OwnedSemaphorePermit) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler = Arc::new(handler);
        loop {
            let permit = {
                let permits = self.permits.clone();
                tokio::select! {
                    biased;
                    _ = self.quit.notified() => return,
                    permit = permits.acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(_) => return,
                    },
                }
            };

            let accepted = tokio::select! {
                biased;
                _ = self.quit.notified() => return,
                accepted = self.listener.accept() => accepted,
            };

            let (socket, peer_addr) = match accepted {
                Ok(pair) => pair,
                Err(error) => {
                    tracing::debug!(%error, "failed to accept a connection");
                    continue;
                }
            };

            if let Err(error) = socket.set_nodelay(true) {
                tracing::debug!(%error, %peer_addr, "failed to set TCP_NODELAY");
            }

            let handler = handler.clone();
            tokio::spawn(async move {
                handler(socket, peer_addr, permit).await;
            });
        }
    }
}

/// Runs `read` and fails with [`io::ErrorKind::TimedOut`] if it doesn't resolve within
/// `deadline`. Every successful read is expected to be followed by the caller re-arming the
/// deadline for the next call — this function does not track idle time across calls itself.
pub async fn with_deadline<F, T>(deadline: Duration, read: F) -> io::Result<T>
where
    F: Future<Output = io::Result<T>>,
{
    match tokio::time::timeout(deadline, read).await {
        Ok(result) => result,
        Err(_) => Err(io::Error::new(io::ErrorKind::TimedOut, "idle timeout exceeded")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn accepts_and_caps_concurrency() {
        let acceptor = Acceptor::bind("127.0.0.1:0".parse().unwrap(), 1).await.unwrap();
        let addr = acceptor.local_addr().unwrap();
        let quit = acceptor.quit_handle();
        let count = Arc::new(AtomicUsize::new(0));
        let count_for_handler = count.clone();

        tokio::spawn(acceptor.run(move |_socket, _peer, _permit| {
            let count = count_for_handler.clone();
            async move {
                count.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        }));

        let mut a = TcpStream::connect(addr).await.unwrap();
        let mut b = TcpStream::connect(addr).await.unwrap();
        a.write_all(b"hi").await.unwrap();
        b.write_all(b"hi").await.unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
        quit.notify_one();
    }

    #[tokio::test]
    async fn with_deadline_times_out() {
        let result: io::Result<()> = with_deadline(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::TimedOut);
    }
}
