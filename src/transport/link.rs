use crate::transport::errors::TransportError;
use futures::{SinkExt, StreamExt};
use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Where to open the duplex link. The auth token travels in the URL, there is no
/// in-band auth step after the link opens.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectRequest {
    url: Url,
}

impl ConnectRequest {
    pub fn new(server_url: &str, token: &str) -> Result<Self, TransportError> {
        if token.trim().is_empty() {
            return Err(TransportError::InvalidConfig(
                "auth token is required".to_string(),
            ));
        }

        let mut url = Url::parse(server_url.trim())
            .map_err(|err| TransportError::InvalidConfig(format!("server url: {err}")))?;
        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => {
                return Err(TransportError::InvalidConfig(format!(
                    "unsupported scheme {other}"
                )))
            }
        };
        url.set_scheme(scheme)
            .map_err(|()| TransportError::InvalidConfig(format!("cannot use scheme {scheme}")))?;
        url.set_path("/ws");
        url.query_pairs_mut().clear().append_pair("token", token);

        Ok(Self { url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl std::fmt::Debug for ConnectRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut redacted = self.url.clone();
        redacted.set_query(None);
        f.debug_struct("ConnectRequest")
            .field("url", &redacted.as_str())
            .finish()
    }
}

/// Everything a link reports back, tagged with the connect attempt that opened it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LinkEvent {
    Opened { attempt: u64 },
    Frame { attempt: u64, text: String },
    Closed { attempt: u64 },
}

impl LinkEvent {
    pub fn attempt(&self) -> u64 {
        match self {
            LinkEvent::Opened { attempt }
            | LinkEvent::Frame { attempt, .. }
            | LinkEvent::Closed { attempt } => *attempt,
        }
    }
}

/// Sending half of an open link. Dropping it cancels the link without a `Closed` report.
#[derive(Debug)]
pub struct LinkHandle {
    outbound: mpsc::UnboundedSender<String>,
    cancel: CancellationToken,
}

impl LinkHandle {
    pub fn new(outbound: mpsc::UnboundedSender<String>, cancel: CancellationToken) -> Self {
        Self { outbound, cancel }
    }

    pub fn send(&self, text: String) -> bool {
        self.outbound.send(text).is_ok()
    }
}

impl Drop for LinkHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

pub trait Connector: Send {
    /// Start opening a link. Progress is reported on `events`; a failed open reports `Closed`.
    fn open(
        &mut self,
        request: ConnectRequest,
        attempt: u64,
        events: mpsc::UnboundedSender<LinkEvent>,
    ) -> LinkHandle;
}

/// Opens links that succeed immediately and discard everything sent through them.
#[derive(Debug, Default)]
pub struct NoopConnector;

impl Connector for NoopConnector {
    fn open(
        &mut self,
        _request: ConnectRequest,
        attempt: u64,
        events: mpsc::UnboundedSender<LinkEvent>,
    ) -> LinkHandle {
        let (outbound, _discarded) = mpsc::unbounded_channel();
        let _ = events.send(LinkEvent::Opened { attempt });
        LinkHandle::new(outbound, CancellationToken::new())
    }
}

/// WebSocket links, each driven by its own tokio task.
#[derive(Debug, Default)]
pub struct WsConnector;

impl Connector for WsConnector {
    fn open(
        &mut self,
        request: ConnectRequest,
        attempt: u64,
        events: mpsc::UnboundedSender<LinkEvent>,
    ) -> LinkHandle {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        tokio::spawn(run_ws_link(
            request,
            attempt,
            outbound_rx,
            events,
            cancel.clone(),
        ));
        LinkHandle::new(outbound_tx, cancel)
    }
}

async fn run_ws_link(
    request: ConnectRequest,
    attempt: u64,
    mut outbound: mpsc::UnboundedReceiver<String>,
    events: mpsc::UnboundedSender<LinkEvent>,
    cancel: CancellationToken,
) {
    debug!("link {attempt}: connecting to {request:?}");
    let connected = tokio::select! {
        _ = cancel.cancelled() => return,
        result = tokio_tungstenite::connect_async(request.url().as_str()) => result,
    };
    let ws_stream = match connected {
        Ok((ws_stream, _)) => ws_stream,
        Err(err) => {
            warn!("link {attempt}: connect failed: {}", TransportError::from(err));
            let _ = events.send(LinkEvent::Closed { attempt });
            return;
        }
    };

    info!("link {attempt}: open");
    let _ = events.send(LinkEvent::Opened { attempt });
    let (mut ws_write, mut ws_read) = ws_stream.split();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("link {attempt}: torn down");
                let _ = ws_write.send(Message::Close(None)).await;
                return;
            }

            Some(text) = outbound.recv() => {
                if let Err(err) = ws_write.send(Message::Text(text.into())).await {
                    warn!("link {attempt}: send failed: {}", TransportError::from(err));
                    break;
                }
            }

            msg = ws_read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let _ = events.send(LinkEvent::Frame {
                            attempt,
                            text: text.as_str().to_owned(),
                        });
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(err)) => {
                        warn!("link {attempt}: read failed: {}", TransportError::from(err));
                        break;
                    }
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    info!("link {attempt}: closed");
    let _ = events.send(LinkEvent::Closed { attempt });
}
