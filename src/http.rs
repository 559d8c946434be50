//! One-shot plain-HTTP responder for the control page.
//!
//! Every request gets the same document regardless of method or path. No
//! state survives a connection.

use std::io;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

/// Serves one connection: discards the request line and headers up to the
/// blank line (or end of stream), writes the page, and lets the connection
/// close.
pub async fn handle<S>(stream: S) -> io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (read_half, mut write_half) = tokio::io::split(stream);
    let mut reader = BufReader::new(read_half);

    let mut line = String::new();
    loop {
        line.clear();
        let n = reader.read_line(&mut line).await?;
        if n == 0 || line == "\r\n" || line == "\n" {
            break;
        }
    }

    let response = format!(
        "HTTP/1.1 200 OK\r\n\
         Content-Type: text/html; charset=utf-8\r\n\
         Connection: close\r\n\
         \r\n\
         {CONTROL_PAGE}"
    );
    write_half.write_all(response.as_bytes()).await?;
    write_half.flush().await
}

/// The control page. Opens a WebSocket back to port 81 of the host that
/// served it, sends `{"g5": <int>, "g6": <int>}` on every slider input
/// event, and reconnects 2 seconds after any close.
pub const CONTROL_PAGE: &str = r##"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>PWM Remote</title>
<style>
  body { font-family: sans-serif; text-align: center; margin: 30px auto; max-width: 400px; }
  input[type=range] { width: 100%; height: 40px; touch-action: none; }
  .value { font-size: 20px; font-weight: bold; color: #333; }
</style>
</head>
<body>
<h2>PWM Remote</h2>
<p>GPIO 5<br>
<input type="range" id="slider1" min="0" max="65535" value="0">
<br><span class="value" id="val1">0</span></p>
<p>GPIO 6<br>
<input type="range" id="slider2" min="0" max="65535" value="0">
<br><span class="value" id="val2">0</span></p>
<p id="status">Connecting...</p>
<script>
let ws;
const status = document.getElementById("status");

function connect() {
  ws = new WebSocket("ws://" + location.hostname + ":81/ws");

  ws.onopen = () => {
    status.textContent = "Connected";
    status.style.color = "green";
  };

  ws.onclose = () => {
    status.textContent = "Disconnected - Retrying...";
    status.style.color = "red";
    setTimeout(connect, 2000);
  };

  ws.onerror = (e) => {
    console.log("WebSocket error", e);
  };
}

function sendValues() {
  if (ws && ws.readyState === WebSocket.OPEN) {
    const v1 = parseInt(slider1.value);
    const v2 = parseInt(slider2.value);
    ws.send(JSON.stringify({ g5: v1, g6: v2 }));
    document.getElementById("val1").textContent = v1;
    document.getElementById("val2").textContent = v2;
  }
}

slider1.oninput = sendValues;
slider2.oninput = sendValues;

connect();
</script>
</body>
</html>
"##;
