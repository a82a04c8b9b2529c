//!
//! portico CLI binary
//! ------------------
//! Diagnostic interpreter for the Portico orchestration layer. Exercises the
//! library against a live deployment (or entirely offline with a canned
//! identity provider): health snapshot, token lookup, session load, guard
//! evaluation, push listen/send and flow dry-runs.

use std::env;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use rustyline::error::ReadlineError;
use serde_json::json;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use portico::cancel::CancelToken;
use portico::claims;
use portico::cli::print_result;
use portico::config::Config;
use portico::flows::{route_for_profile, PaymentReturnFlow};
use portico::guard::{GuardView, RouteGuard};
use portico::health;
use portico::provider::{HostedProvider, IdentityProvider, StaticProvider};
use portico::push::PushHook;
use portico::session::SessionContext;
use portico::storage::CredentialCache;
use portico::token;

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [--offline] [--api <url>] [--provider <url>] [--push <host>] [--cache <path>] [--exec \"<command>\"]\n  {program} --repl    # default when --exec is absent\n\nFlags:\n  --api <url>        REST API base (default: PORTICO_API_BASE or https://api.portico.dev)\n  --provider <url>   Identity provider base (default: PORTICO_PROVIDER_BASE)\n  --push <host>      Push endpoint host; ws:// or wss:// kept as-is\n  --cache <path>     Credential snapshot file (default: in-memory)\n  --offline          Use a canned identity provider and a seeded dev token\n  --exec <command>   Run one interpreter command and exit\n  -h, --help         Show this help\n\nInteractive commands:\n  health                      fetch the monitoring snapshot\n  token list | token id       inspect the credential cache\n  token set <key> <value>     seed a cache entry\n  session load | session show load/inspect the session store\n  guard admin | guard auth    evaluate a route guard\n  check provider              provider-profile existence check\n  payment <query-string>      payment-return dry-run (e.g. ?paymentId=pay_1)\n  listen <user_id>            open the push channel for an identity\n  send <json>                 send one frame on the push channel\n  disconnect                  close the push channel\n  status                      show connection and config info\n  help                        show this help\n  quit | exit                 leave the interpreter"
    );
}

struct CliState {
    cfg: Config,
    cache: CredentialCache,
    provider: Arc<dyn IdentityProvider>,
    session: SessionContext,
    push: PushHook,
    cancel: CancelToken,
}

fn dev_provider(cache: &CredentialCache) -> StaticProvider {
    // Offline identity: a provider-role token with admin group membership,
    // mirrored into the cache so the token accessor finds it.
    let token_value = claims::unsigned_token(&json!({
        "custom:role": "provider",
        "cognito:groups": ["Administrator"],
        "email": "dev@portico.dev",
    }));
    cache.set("CognitoIdentityServiceProvider.portico.dev-user.idToken", token_value.clone());
    StaticProvider::authenticated("dev-user", &token_value)
}

async fn run_command(state: &mut CliState, line: &str) -> Result<bool> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(false);
    }
    let mut words = trimmed.split_whitespace();
    let head = words.next().unwrap_or("");
    match head {
        "quit" | "exit" => return Ok(true),
        "help" => print_usage("portico_cli"),
        "status" => {
            let connected = state.push.channel().map(|c| c.user_id().to_string());
            let val = json!({
                "api_base": state.cfg.api_base,
                "provider_base": state.cfg.provider_base,
                "push_host": state.cfg.push_host,
                "push_identity": connected,
                "cached_entries": state.cache.len(),
            });
            if !print_result(&val) { println!("{}", val); }
        }
        "health" => match health::fetch_status(&state.cfg, &state.cache).await {
            Ok(body) => {
                if !print_result(&body) { println!("{}", body); }
            }
            Err(e) => eprintln!("health check failed: {e}"),
        },
        "token" => match words.next() {
            Some("list") => {
                let keys: Vec<serde_json::Value> = state
                    .cache
                    .entries()
                    .into_iter()
                    .map(|(k, _)| json!({"key": k}))
                    .collect();
                let val = json!(keys);
                if !print_result(&val) { println!("{}", val); }
            }
            Some("id") => match token::id_token(&state.cache) {
                Ok(t) => println!("{}", t),
                Err(e) => eprintln!("{e}"),
            },
            Some("set") => {
                let key = words.next().ok_or_else(|| anyhow!("token set <key> <value>"))?;
                let value = words.next().ok_or_else(|| anyhow!("token set <key> <value>"))?;
                state.cache.set(key, value);
                println!("ok");
            }
            _ => eprintln!("usage: token list | token id | token set <key> <value>"),
        },
        "session" => match words.next() {
            Some("load") => {
                let snapshot = state.session.load(&state.cancel).await;
                if !print_result(&serde_json::to_value(&snapshot)?) {
                    println!("{}", serde_json::to_value(&snapshot)?);
                }
            }
            Some("show") => {
                let snapshot = state.session.snapshot();
                if !print_result(&serde_json::to_value(&snapshot)?) {
                    println!("{}", serde_json::to_value(&snapshot)?);
                }
            }
            _ => eprintln!("usage: session load | session show"),
        },
        "guard" => {
            let mut guard = match words.next() {
                Some("admin") => RouteGuard::admin(),
                Some("auth") => RouteGuard::authenticated(),
                _ => {
                    eprintln!("usage: guard admin | guard auth");
                    return Ok(false);
                }
            };
            let access = guard.check(state.provider.as_ref(), &state.cancel).await;
            match guard.view() {
                GuardView::Checking => println!("access: {:?} (still checking)", access),
                GuardView::Content => println!("access: {:?} -> render protected content", access),
                GuardView::Redirect(to) => println!("access: {:?} -> redirect {}", access, to),
            }
        }
        "check" => match words.next() {
            Some("provider") => {
                let snapshot = state.session.snapshot();
                let Some(tok) = snapshot.token else {
                    eprintln!("no session token; run `session load` first");
                    return Ok(false);
                };
                let dest = route_for_profile(&state.cfg, &tok).await;
                println!("navigate: {}", dest);
            }
            _ => eprintln!("usage: check provider"),
        },
        "payment" => {
            let query = words.next().unwrap_or("");
            let mut flow = PaymentReturnFlow::from_query(query);
            if let Some(msg) = flow.message() {
                println!("{}", msg);
                return Ok(false);
            }
            match flow.run(&state.cfg, &state.cancel).await {
                Some(dest) => println!("navigate: {}", dest),
                None => println!("no navigation"),
            }
        }
        "listen" => {
            let Some(user_id) = words.next() else {
                eprintln!("usage: listen <user_id>");
                return Ok(false);
            };
            match state.push.set_identity(Some(user_id)).await {
                Ok(()) => println!("listening as {}", user_id),
                Err(e) => eprintln!("push connect failed: {e}"),
            }
        }
        "send" => {
            let rest = trimmed.strip_prefix("send").unwrap_or("").trim();
            if rest.is_empty() {
                eprintln!("usage: send <json>");
                return Ok(false);
            }
            let payload: serde_json::Value = serde_json::from_str(rest)
                .map_err(|e| anyhow!("payload is not valid JSON: {e}"))?;
            if state.push.send(&payload).await {
                println!("sent");
            } else {
                println!("not sent: channel not open");
            }
        }
        "disconnect" => {
            state.push.shutdown().await;
            println!("disconnected");
        }
        other => eprintln!("unknown command: {} (try `help`)", other),
    }
    Ok(false)
}

async fn repl(mut state: CliState) -> Result<()> {
    let mut rl = rustyline::DefaultEditor::new()?;
    loop {
        match rl.readline("portico> ") {
            Ok(line) => {
                let _ = rl.add_history_entry(line.as_str());
                match run_command(&mut state, &line).await {
                    Ok(true) => break,
                    Ok(false) => {}
                    Err(e) => eprintln!("error: {e}"),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(anyhow!("readline failed: {e}")),
        }
    }
    state.push.shutdown().await;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    fmt().with_env_filter(filter).init();

    let mut cfg = Config::from_env();
    let mut offline = false;
    let mut cache_path: Option<String> = None;
    let mut exec: Option<String> = None;

    let args: Vec<String> = env::args().collect();
    let program = args.first().cloned().unwrap_or_else(|| "portico_cli".to_string());
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_usage(&program);
                return Ok(());
            }
            "--offline" => offline = true,
            "--repl" => {} // default mode
            "--api" => {
                i += 1;
                cfg.api_base = args.get(i).cloned().ok_or_else(|| anyhow!("--api needs a value"))?;
            }
            "--provider" => {
                i += 1;
                cfg.provider_base = args.get(i).cloned().ok_or_else(|| anyhow!("--provider needs a value"))?;
            }
            "--push" => {
                i += 1;
                cfg.push_host = args.get(i).cloned().ok_or_else(|| anyhow!("--push needs a value"))?;
            }
            "--cache" => {
                i += 1;
                cache_path = Some(args.get(i).cloned().ok_or_else(|| anyhow!("--cache needs a value"))?);
            }
            "--exec" => {
                i += 1;
                exec = Some(args.get(i).cloned().ok_or_else(|| anyhow!("--exec needs a value"))?);
            }
            other => {
                eprintln!("unknown flag: {}", other);
                print_usage(&program);
                return Ok(());
            }
        }
        i += 1;
    }

    let cache = match &cache_path {
        Some(p) => CredentialCache::with_snapshot(p)?,
        None => CredentialCache::in_memory(),
    };
    let provider: Arc<dyn IdentityProvider> = if offline {
        Arc::new(dev_provider(&cache))
    } else {
        Arc::new(HostedProvider::new(&cfg.provider_base)?)
    };
    let session = SessionContext::new(provider.clone());
    let push = PushHook::new(&cfg.push_host, |payload| {
        println!("push <- {}", payload);
    });

    info!(
        target: "cli",
        "portico_cli starting: api={}, provider={}, push={}, offline={}",
        cfg.api_base, cfg.provider_base, cfg.push_host, offline
    );

    let mut state = CliState { cfg, cache, provider, session, push, cancel: CancelToken::new() };

    if let Some(cmd) = exec {
        run_command(&mut state, &cmd).await?;
        state.push.shutdown().await;
        return Ok(());
    }
    repl(state).await
}
