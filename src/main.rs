use anyhow::{Context, anyhow};
use getopts::Options;
use log::{error, info, warn};
use mailpost::{Credentials, Mailbox, Pop3Server, SmtpServer};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use std::env;
use std::net::TcpListener;
use std::process;
use std::sync::{Arc, mpsc};
use std::thread;

const DOMAIN: &str = "mailpost.local";
const DEFAULT_SMTP_ADDRESS: &str = "127.0.0.1:2525";
const DEFAULT_POP3_ADDRESS: &str = "127.0.0.1:1110";

// Command line option names
const OPT_HELP: &str = "help";
const OPT_SMTP: &str = "smtp";
const OPT_POP3: &str = "pop3";
const OPT_SERVER: &str = "server";
const OPT_AUTH: &str = "auth";
const OPT_USER: &str = "user";
const OPT_SEED: &str = "seed";
const OPT_LOG: &str = "log";

fn setup_logger(level: LevelFilter) -> anyhow::Result<()> {
    TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .map_err(|err| anyhow!("Cannot initialize logger: {err}"))
}

fn print_usage(program: &str, opts: &Options) {
    let brief = format!("Usage: {program} [options]");
    print!("{}", opts.usage(&brief));
}

fn parse_credentials(accounts: &[String]) -> anyhow::Result<Credentials> {
    let mut credentials = Credentials::new();
    for account in accounts {
        let (user, password) = account
            .split_once(':')
            .filter(|(user, _)| !user.is_empty())
            .ok_or_else(|| anyhow!("Expected USER:PASSWORD, got '{account}'"))?;
        credentials.insert(user, password);
    }
    Ok(credentials)
}

fn bind(addr: &str) -> anyhow::Result<TcpListener> {
    TcpListener::bind(addr).with_context(|| format!("Cannot open listen address {addr}"))
}

fn run() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    let mut opts = Options::new();
    opts.optflag("h", OPT_HELP, "print this help menu");
    opts.optopt("", OPT_SMTP, "the address to accept SMTP on", "ADDRESS");
    opts.optopt("", OPT_POP3, "the address to accept POP3 on", "ADDRESS");
    opts.optopt("s", OPT_SERVER, "the name of the mailserver", "SERVER");
    opts.optflag("", OPT_AUTH, "advertise and accept SMTP AUTH PLAIN");
    opts.optmulti("u", OPT_USER, "an account for AUTH and POP3", "USER:PASSWORD");
    opts.optflag("", OPT_SEED, "start with sample messages in the mailbox");
    opts.optopt("l", OPT_LOG, "log level (error, warn, info, debug, trace)", "LEVEL");
    let matches = opts
        .parse(&args[1..])
        .map_err(|err| anyhow!("Error parsing command line: {err}"))?;
    if matches.opt_present(OPT_HELP) {
        print_usage(&args[0], &opts);
        return Ok(());
    }

    let level = match matches.opt_str(OPT_LOG) {
        Some(level) => level
            .parse()
            .map_err(|_| anyhow!("Unknown log level '{level}'"))?,
        None => LevelFilter::Info,
    };
    setup_logger(level)?;

    let mut credentials = parse_credentials(&matches.opt_strs(OPT_USER))?;
    if credentials.is_empty() {
        warn!("No accounts given, using test:test");
        credentials.insert("test", "test");
    }

    let domain = matches
        .opt_str(OPT_SERVER)
        .unwrap_or_else(|| DOMAIN.to_owned());
    let smtp_listener = bind(
        &matches
            .opt_str(OPT_SMTP)
            .unwrap_or_else(|| DEFAULT_SMTP_ADDRESS.to_owned()),
    )?;
    let pop3_listener = bind(
        &matches
            .opt_str(OPT_POP3)
            .unwrap_or_else(|| DEFAULT_POP3_ADDRESS.to_owned()),
    )?;

    let mailbox = Arc::new(if matches.opt_present(OPT_SEED) {
        Mailbox::with_samples()
    } else {
        Mailbox::new()
    });

    let mut smtp = SmtpServer::new(&domain);
    if matches.opt_present(OPT_AUTH) {
        smtp = smtp.with_auth(credentials.clone());
    }
    let pop3 = Pop3Server::new(&domain, credentials).with_mailbox(Arc::clone(&mailbox));

    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("smtp".to_owned())
        .spawn(move || {
            if let Err(err) = smtp.start_with_listener(smtp_listener, tx) {
                error!("SMTP server stopped: {err}");
            }
        })?;
    thread::Builder::new()
        .name("pop3".to_owned())
        .spawn(move || {
            if let Err(err) = pop3.start_with_listener(pop3_listener) {
                error!("POP3 server stopped: {err}");
            }
        })?;

    // Submitted mail becomes retrievable over POP3
    for envelope in rx {
        let number = mailbox.append(envelope);
        info!("Stored message {number}");
    }

    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:#}");
        process::exit(1);
    }
}
