//! In-process HTTP server and archive fixtures shared by the integration tests.

#![allow(dead_code)]

use std::{collections::HashMap, path::Path, sync::Arc, time::Duration};

use flate2::{write::GzEncoder, Compression};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};

/// How the server answers one path.
#[derive(Debug, Clone)]
pub enum Reply {
    Full { status: u16, body: Vec<u8> },
    /// Promises `claimed` bytes, sends `body`, then closes the connection.
    Truncated { body: Vec<u8>, claimed: usize },
    /// Sends headers and `body`, then holds the connection open.
    Stall { body: Vec<u8>, claimed: usize },
    /// Reads the request and never answers.
    Silent,
}

impl Reply {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Reply::Full {
            status: 200,
            body: body.into(),
        }
    }

    pub fn status(status: u16) -> Self {
        Reply::Full {
            status,
            body: Vec::new(),
        }
    }
}

/// Serves `routes` on an ephemeral port and returns `http://127.0.0.1:{port}`.
pub async fn serve(routes: HashMap<String, Reply>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let routes = Arc::new(routes);

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            let routes = routes.clone();
            tokio::spawn(async move {
                handle(stream, &routes).await;
            });
        }
    });

    format!("http://{}", addr)
}

/// An address with nothing listening on it.
pub async fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    format!("http://{}", addr)
}

async fn handle(mut stream: TcpStream, routes: &HashMap<String, Reply>) {
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => request.extend_from_slice(&buf[..n]),
        }
    }

    let request = String::from_utf8_lossy(&request);
    let path = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .trim_end_matches('/')
        .to_string();

    let reply = routes.get(&path).cloned().unwrap_or(Reply::status(404));

    match reply {
        Reply::Full { status, body } => {
            let _ = stream.write_all(&head(status, body.len())).await;
            let _ = stream.write_all(&body).await;
            let _ = stream.shutdown().await;
        }
        Reply::Truncated { body, claimed } => {
            let _ = stream.write_all(&head(200, claimed)).await;
            let _ = stream.write_all(&body).await;
            let _ = stream.shutdown().await;
        }
        Reply::Stall { body, claimed } => {
            let _ = stream.write_all(&head(200, claimed)).await;
            let _ = stream.write_all(&body).await;
            let _ = stream.flush().await;
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
        Reply::Silent => {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
    }
}

fn head(status: u16, content_length: usize) -> Vec<u8> {
    let reason = match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Status",
    };
    format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nContent-Type: application/octet-stream\r\nConnection: close\r\n\r\n",
        status, reason, content_length
    )
    .into_bytes()
}

/// A listing page in the layout NOAA serves.
pub fn listing(entries: &[(&str, &str, &str)]) -> String {
    let mut html = String::from(
        r#"<html><body><h1>Index of /data/global-summary-of-the-day/archive</h1>
<table>
 <tr><th><a href="?C=N;O=D">Name</a></th><th><a href="?C=M;O=A">Last modified</a></th><th><a href="?C=S;O=A">Size</a></th><th><a href="?C=D;O=A">Description</a></th></tr>
 <tr><th colspan="4"><hr></th></tr>
<tr><td><a href="/data/global-summary-of-the-day/">Parent Directory</a></td><td>&nbsp;</td><td align="right">  - </td><td>&nbsp;</td></tr>
"#,
    );
    for (name, modified, size) in entries {
        html.push_str(&format!(
            "<tr><td><a href=\"{0}\">{0}</a></td><td align=\"right\">{1}  </td><td align=\"right\"> {2}</td><td>&nbsp;</td></tr>\n",
            name, modified, size
        ));
    }
    html.push_str(" <tr><th colspan=\"4\"><hr></th></tr>\n</table>\n</body></html>\n");
    html
}

pub const HEADER: &str = "\"STATION\",\"DATE\",\"LATITUDE\",\"LONGITUDE\",\"ELEVATION\",\"NAME\",\"TEMP\",\"TEMP_ATTRIBUTES\",\"DEWP\",\"DEWP_ATTRIBUTES\",\"SLP\",\"SLP_ATTRIBUTES\",\"STP\",\"STP_ATTRIBUTES\",\"VISIB\",\"VISIB_ATTRIBUTES\",\"WDSP\",\"WDSP_ATTRIBUTES\",\"MXSPD\",\"GUST\",\"MAX\",\"MAX_ATTRIBUTES\",\"MIN\",\"MIN_ATTRIBUTES\",\"PRCP\",\"PRCP_ATTRIBUTES\",\"SNDP\",\"FRSHTT\"";

/// A station member with `rows` daily readings at a fixed location.
pub fn station_csv(station: &str, rows: usize, elevation: &str) -> String {
    let mut csv = format!("{}\n", HEADER);
    for day in 1..=rows {
        csv.push_str(&format!(
            "\"{}\",\"2021-01-{:02}\",\"70.93\",\"-8.66\",\"{}\",\"JAN MAYEN, NO\",\"  22.1\",\"24\",\"  16.9\",\"24\",\"1002.6\",\"24\",\"1001.5\",\"24\",\"  9.1\",\"6\",\"  9.9\",\"24\",\" 15.9\",\" 21.0\",\"  25.7\",\" \",\"  18.5\",\" \",\" 0.06\",\"E\",\"999.9\",\"001000\"\n",
            station, day, elevation
        ));
    }
    csv
}

/// Builds a gzipped tar archive in memory.
pub fn tar_gz(members: &[(&str, String)]) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));

    for (member, content) in members {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, member, content.as_bytes())
            .unwrap();
    }

    builder.into_inner().unwrap().finish().unwrap()
}

pub fn write_tar_gz(path: &Path, members: &[(&str, String)]) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, tar_gz(members)).unwrap();
}
