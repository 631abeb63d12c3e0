//! Drives a client against a scripted gdb peer over an in-memory pipe.

use std::time::Duration;

use mi2_core::{
    ops, Breakpoint, ClientEvent, ClientState, EventKind, Mi2Client, Mi2Config, StopReason,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};

/// Answers the two commands this session sends, then hangs up.
async fn scripted_gdb(peer: DuplexStream) {
    let mut peer = BufReader::new(peer);
    peer.write_all(b"=thread-group-added,id=\"i1\"\n~\"GNU gdb (GDB) 14.2\\n\"\n(gdb) \n")
        .await
        .unwrap();

    let mut line = String::new();
    while peer.read_line(&mut line).await.unwrap() > 0 {
        let reply: &[u8] = match line.trim_end() {
            "-break-insert --function main" => {
                b"^done,bkpt={number=\"1\",type=\"breakpoint\",func=\"main\",file=\"hello.c\",line=\"4\"}\n(gdb) \n"
            }
            "-exec-run --start" => concat!(
                "=thread-group-started,id=\"i1\",pid=\"4242\"\n",
                "^running\n",
                "*running,thread-id=\"all\"\n",
                "(gdb) \n",
                "~\"\\nBreakpoint 1, main () at hello.c:4\\n\"\n",
                "*stopped,reason=\"breakpoint-hit\",disp=\"keep\",bkptno=\"1\",",
                "frame={addr=\"0x401136\",func=\"main\",args=[],file=\"hello.c\",line=\"4\"},",
                "thread-id=\"1\",stopped-threads=\"all\"\n",
                "(gdb) \n",
            )
            .as_bytes(),
            other => panic!("unexpected command {other:?}"),
        };
        peer.write_all(reply).await.unwrap();
        if line.starts_with("-exec-run") {
            break;
        }
        line.clear();
    }
}

async fn collect_until_stopped(
    rx: &mut tokio::sync::mpsc::Receiver<ClientEvent>,
) -> Vec<ClientEvent> {
    let mut seen = Vec::new();
    loop {
        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out")
            .expect("channel closed");
        let done = matches!(event, ClientEvent::Stopped { .. });
        seen.push(event);
        if done {
            return seen;
        }
    }
}

#[tokio::test]
async fn breakpoint_run_and_stop_session() {
    let (local, peer) = tokio::io::duplex(8192);
    let gdb = tokio::spawn(scripted_gdb(peer));

    let mut client = Mi2Client::with_config(local, Mi2Config::default());
    let mut rx = client.subscribe();
    client.start_listening().unwrap();

    ops::breakpoints::insert_breakpoint(&client, &Breakpoint::at_function("main"))
        .await
        .unwrap();
    ops::exec::run(&client).await.unwrap();

    let events = collect_until_stopped(&mut rx).await;

    let transcript: String = events
        .iter()
        .filter_map(|e| match e {
            ClientEvent::Log(text) => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(
        transcript,
        "GNU gdb (GDB) 14.2\n\nBreakpoint 1, main () at hello.c:4\n"
    );

    let inserted = events
        .iter()
        .find_map(|e| match e {
            ClientEvent::BreakpointInserted(bp) => Some(bp.clone()),
            _ => None,
        })
        .expect("breakpoint insertion was reported");
    assert_eq!(inserted.id, Some(1));
    assert_eq!(inserted.filename.as_deref(), Some("hello.c"));

    let results: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            ClientEvent::Event(ev) if ev.kind() == EventKind::Result => Some(ev.name()),
            _ => None,
        })
        .collect();
    assert_eq!(results, vec!["done", "running"]);

    match events.last() {
        Some(ClientEvent::Stopped { reason, event }) => {
            assert_eq!(*reason, StopReason::BreakpointHit);
            let frame = event.param("frame").expect("frame parameter");
            assert_eq!(frame.get("func").and_then(|v| v.as_str()), Some("main"));
        }
        other => panic!("unexpected last event {other:?}"),
    }

    gdb.await.unwrap();
    client.join_read_loop().await;
    assert_eq!(client.state(), ClientState::Stopped);
}

#[tokio::test]
async fn prompt_only_stream_ends_quietly() {
    let (local, mut peer) = tokio::io::duplex(1024);
    let mut client = Mi2Client::new(local);
    let mut rx = client.subscribe();
    client.start_listening().unwrap();

    peer.write_all(b"(gdb) \n(gdb) \n(gdb) \n").await.unwrap();
    drop(peer);

    client.join_read_loop().await;
    assert_eq!(client.state(), ClientState::Stopped);
    assert!(rx.try_recv().is_err());
}
