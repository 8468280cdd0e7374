use ferrous_dsync_domain::rr::wire::WireReader;
use ferrous_dsync_domain::ResourceRecord;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, UdpSocket};
use tokio::sync::{oneshot, RwLock};

/// How the mock answers every request it receives.
#[derive(Clone)]
pub enum Reply {
    Answer {
        rcode: u8,
        answers: Vec<ResourceRecord>,
        ede: Option<(u16, String)>,
    },
    /// Reads requests and never answers.
    Silent,
    /// UDP answers carry only the TC bit; TCP serves `answers`.
    Truncated { answers: Vec<ResourceRecord> },
}

impl Reply {
    pub fn rcode(rcode: u8) -> Self {
        Reply::Answer {
            rcode,
            answers: Vec::new(),
            ede: None,
        }
    }

    pub fn answers(answers: Vec<ResourceRecord>) -> Self {
        Reply::Answer {
            rcode: 0,
            answers,
            ede: None,
        }
    }

    pub fn with_ede(rcode: u8, code: u16, text: &str) -> Self {
        Reply::Answer {
            rcode,
            answers: Vec::new(),
            ede: Some((code, text.to_string())),
        }
    }
}

/// UDP + TCP DNS server on one loopback port with a scripted reply.
pub struct MockDnsServer {
    addr: SocketAddr,
    requests: Arc<RwLock<Vec<Vec<u8>>>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockDnsServer {
    pub async fn start(reply: Reply) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let socket = UdpSocket::bind(addr).await.unwrap();
        let requests = Arc::new(RwLock::new(Vec::new()));
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let seen = Arc::clone(&requests);
        tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    result = socket.recv_from(&mut buf) => {
                        let Ok((len, peer)) = result else { continue };
                        let request = buf[..len].to_vec();
                        seen.write().await.push(request.clone());
                        if let Some(response) = respond(&request, &reply, false) {
                            let _ = socket.send_to(&response, peer).await;
                        }
                    }
                    accepted = listener.accept() => {
                        let Ok((mut stream, _)) = accepted else { continue };
                        let mut len_buf = [0u8; 2];
                        if stream.read_exact(&mut len_buf).await.is_err() {
                            continue;
                        }
                        let mut request = vec![0u8; u16::from_be_bytes(len_buf) as usize];
                        if stream.read_exact(&mut request).await.is_err() {
                            continue;
                        }
                        seen.write().await.push(request.clone());
                        if let Some(response) = respond(&request, &reply, true) {
                            let mut frame = (response.len() as u16).to_be_bytes().to_vec();
                            frame.extend_from_slice(&response);
                            let _ = stream.write_all(&frame).await;
                        }
                    }
                }
            }
        });

        Self {
            addr,
            requests,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn addr(&self) -> String {
        self.addr.to_string()
    }

    pub async fn requests(&self) -> Vec<Vec<u8>> {
        self.requests.read().await.clone()
    }
}

impl Drop for MockDnsServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Hand-built response: header, echoed question, answers and an optional
/// OPT record carrying an Extended DNS Error.
fn respond(request: &[u8], reply: &Reply, over_tcp: bool) -> Option<Vec<u8>> {
    let (rcode, answers, ede, truncated) = match reply {
        Reply::Silent => return None,
        Reply::Answer {
            rcode,
            answers,
            ede,
        } => (*rcode, answers.as_slice(), ede.as_ref(), false),
        Reply::Truncated { answers } if over_tcp => (0, answers.as_slice(), None, false),
        Reply::Truncated { .. } => (0, &[][..], None, true),
    };

    let question_end = question_end(request)?;
    let mut response = Vec::with_capacity(512);
    response.extend_from_slice(&request[0..2]);
    // QR, opcode copied from the request, TC when truncating
    response.push(0x80 | (request[2] & 0x78) | if truncated { 0x02 } else { 0x00 });
    response.push(rcode & 0x0F);
    response.extend_from_slice(&request[4..6]);
    response.extend_from_slice(&(answers.len() as u16).to_be_bytes());
    response.extend_from_slice(&[0x00, 0x00]);
    response.extend_from_slice(&[0x00, if ede.is_some() { 1 } else { 0 }]);
    response.extend_from_slice(&request[12..question_end]);

    for rr in answers {
        response.extend_from_slice(&rr.to_wire());
    }

    if let Some((code, text)) = ede {
        let option_len = 2 + text.len() as u16;
        response.push(0x00);
        response.extend_from_slice(&41u16.to_be_bytes());
        response.extend_from_slice(&1232u16.to_be_bytes());
        response.extend_from_slice(&[0, 0, 0, 0]);
        response.extend_from_slice(&(4 + option_len).to_be_bytes());
        response.extend_from_slice(&15u16.to_be_bytes());
        response.extend_from_slice(&option_len.to_be_bytes());
        response.extend_from_slice(&code.to_be_bytes());
        response.extend_from_slice(text.as_bytes());
    }
    Some(response)
}

fn question_end(request: &[u8]) -> Option<usize> {
    let qdcount = u16::from_be_bytes([*request.get(4)?, *request.get(5)?]);
    let mut reader = WireReader::at(request, 12);
    for _ in 0..qdcount {
        reader.read_name().ok()?;
        reader.read_u16().ok()?;
        reader.read_u16().ok()?;
    }
    Some(reader.position())
}
