//! End-to-end POP3 sessions over real sockets

use mailpost::{Credentials, Envelope, Mailbox, Pop3Server};
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn start_test_server(sizes: &[usize]) -> (String, Arc<Mailbox>) {
    let mailbox = Arc::new(Mailbox::new());
    for &size in sizes {
        mailbox.append(Envelope::new().with_body(&"x".repeat(size)));
    }

    let credentials = Credentials::new().with_user("bob", "secret");
    let server = Pop3Server::new("test.local", credentials).with_mailbox(Arc::clone(&mailbox));
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    thread::spawn(move || {
        if let Err(e) = server.start_with_listener(listener) {
            eprintln!("Error starting server: {e}");
        }
    });

    (addr, mailbox)
}

struct Client {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl Client {
    fn connect(addr: &str) -> Self {
        let stream = TcpStream::connect(addr).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        let reader = BufReader::new(stream.try_clone().unwrap());
        let mut client = Self {
            reader,
            writer: stream,
        };
        assert_eq!(client.read_line(), "+OK test.local POP3 server ready");
        client
    }

    fn read_line(&mut self) -> String {
        let mut line = String::new();
        self.reader.read_line(&mut line).unwrap();
        line.trim_end().to_string()
    }

    fn send(&mut self, command: &str) -> String {
        write!(self.writer, "{command}\r\n").unwrap();
        self.writer.flush().unwrap();
        self.read_line()
    }

    /// Read the lines of a multi-line reply up to the terminating dot
    fn read_body(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        loop {
            let line = self.read_line();
            if line == "." {
                return lines;
            }
            lines.push(line);
        }
    }

    fn login(&mut self) {
        assert!(self.send("USER bob").starts_with("+OK"));
        assert!(self.send("PASS secret").starts_with("+OK"));
    }
}

#[test]
fn test_login_retry_after_wrong_password() {
    let (addr, _mailbox) = start_test_server(&[]);
    let mut client = Client::connect(&addr);

    assert!(client.send("STAT").starts_with("-ERR"));
    assert_eq!(client.send("USER bob"), "+OK User accepted");
    assert_eq!(client.send("PASS wrong"), "-ERR Invalid credentials");
    // The username is kept, only the password needs resending
    assert_eq!(client.send("PASS secret"), "+OK Authenticated");
    assert_eq!(client.send("STAT"), "+OK 0 0");
}

#[test]
fn test_unknown_user_looks_like_wrong_password() {
    let (addr, _mailbox) = start_test_server(&[]);
    let mut client = Client::connect(&addr);

    client.send("USER mallory");
    assert_eq!(client.send("PASS secret"), "-ERR Invalid credentials");
}

#[test]
fn test_stat_and_list() {
    let (addr, _mailbox) = start_test_server(&[10, 20, 30]);
    let mut client = Client::connect(&addr);
    client.login();

    assert_eq!(client.send("STAT"), "+OK 3 60");
    assert_eq!(client.send("LIST"), "+OK 3 messages");
    assert_eq!(client.read_body(), ["1 10", "2 20", "3 30"]);
    assert_eq!(client.send("LIST 2"), "+OK 2 20");
    assert!(client.send("LIST 9").starts_with("-ERR"));
}

#[test]
fn test_retr() {
    let (addr, mailbox) = start_test_server(&[]);
    mailbox.append(
        Envelope::new()
            .with_header("Subject", "hi")
            .with_body("line one\r\n.dot line\r\n"),
    );
    let mut client = Client::connect(&addr);
    client.login();

    assert_eq!(client.send("RETR 1"), "+OK 30");
    assert_eq!(
        client.read_body(),
        ["Subject: hi", "", "line one", "..dot line"]
    );
}

#[test]
fn test_retr_invalid_index() {
    let (addr, _mailbox) = start_test_server(&[10, 20, 30]);
    let mut client = Client::connect(&addr);
    client.login();

    assert_eq!(client.send("RETR 5"), "-ERR No such message");
    assert!(client.send("RETR x").starts_with("-ERR"));
    // No stray multi-line output follows the error
    assert_eq!(client.send("NOOP"), "+OK");
}

#[test]
fn test_dele_keeps_numbering() {
    let (addr, mailbox) = start_test_server(&[10, 20, 30]);
    let mut client = Client::connect(&addr);
    client.login();

    assert!(client.send("DELE 2").starts_with("+OK"));
    assert!(client.send("DELE 2").starts_with("-ERR"));
    assert!(client.send("RETR 2").starts_with("-ERR"));

    assert_eq!(client.send("LIST"), "+OK 2 messages");
    assert_eq!(client.read_body(), ["1 10", "3 30"]);
    assert_eq!(client.send("STAT"), "+OK 2 40");
    assert_eq!(mailbox.len(), 2);
}

#[test]
fn test_quit_closes_connection() {
    let (addr, _mailbox) = start_test_server(&[]);
    let mut client = Client::connect(&addr);

    assert_eq!(client.send("QUIT"), "+OK Bye");

    let mut rest = String::new();
    assert_eq!(client.reader.read_line(&mut rest).unwrap(), 0);
}

#[test]
fn test_concurrent_dele() {
    let (addr, mailbox) = start_test_server(&[5; 20]);

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let addr = addr.clone();
            thread::spawn(move || {
                let mut client = Client::connect(&addr);
                client.login();
                let deleted = (1..=20)
                    .filter(|n| client.send(&format!("DELE {n}")).starts_with("+OK"))
                    .count();
                client.send("QUIT");
                deleted
            })
        })
        .collect();

    let deleted: usize = workers.into_iter().map(|w| w.join().unwrap()).sum();
    assert_eq!(deleted, 20);
    assert!(mailbox.is_empty());
}

#[test]
fn test_messages_visible_across_sessions() {
    let (addr, mailbox) = start_test_server(&[]);
    let mut first = Client::connect(&addr);
    first.login();
    assert_eq!(first.send("STAT"), "+OK 0 0");

    mailbox.append(Envelope::new().with_body("0123456789"));

    let mut second = Client::connect(&addr);
    second.login();
    assert_eq!(second.send("STAT"), "+OK 1 10");
    assert_eq!(first.send("STAT"), "+OK 1 10");
}
