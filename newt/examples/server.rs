use std::fmt::Write;
use std::net::UdpSocket;
use std::time::{Duration, Instant};

use newt::config::Config;
use newt::discovery::{well_known_core, Link, WELL_KNOWN_CORE};
use newt::endpoint::Endpoint;
use newt::msg::{Code, ContentFormat};
use newt::resource::{handler, Exchange};

const LINKS: &[Link<'static>] = &[Link { path: "hello",
                                         attrs: "" },
                                  Link { path: "sensor/temp",
                                         attrs: "rt=\"temperature\";obs" }];

type Ep = Endpoint<newt::std::Platform>;

fn temperature(tick: u32) -> f32 {
  20.0 + (tick % 10) as f32 * 0.5
}

fn route(ex: &mut Exchange<'_, '_, 4>, tick: u32) {
  let req = *ex.req().data();

  if req.path_matches(WELL_KNOWN_CORE) {
    well_known_core(ex, LINKS);
  } else if req.path_matches("hello") {
    if let Some(resp) = ex.resp() {
      resp.set_payload(b"Hello, world!").ok();
    }
  } else if req.path_matches("sensor/temp") {
    if let Some(resp) = ex.resp() {
      resp.opts.content_format = Some(ContentFormat::Text);
      write!(resp, "{:.1}C", temperature(tick)).ok();
    }
    ex.observe("sensor/temp");
  } else if let Some(resp) = ex.resp() {
    resp.fail(Code::NOT_FOUND, "Not found");
  }
}

pub fn main() {
  simple_logger::init_with_level(log::Level::Debug).unwrap();

  let sock = UdpSocket::bind("127.0.0.1:5683").unwrap();
  sock.set_nonblocking(true).unwrap();
  log::info!("listening on {}", sock.local_addr().unwrap());

  let mut ep = Ep::new(Config::default(), newt::std::Clock::new(), sock);

  let mut tick = 0u32;
  let mut last_notified = Instant::now();

  loop {
    let mut dispatch = handler::<_, 4>(|ex| route(ex, tick));

    match ep.poll(&mut dispatch) {
      | Ok(()) => continue,
      | Err(nb::Error::WouldBlock) => (),
      | Err(nb::Error::Other(e)) => log::error!("{}", e),
    }

    if let Err(e) = ep.tick() {
      log::error!("{}", e);
    }

    if last_notified.elapsed() >= Duration::from_secs(5) {
      tick += 1;
      last_notified = Instant::now();

      let mut payload = String::new();
      write!(payload, "{:.1}C", temperature(tick)).ok();

      match ep.notify_observers("sensor/temp", tick, payload.as_bytes()) {
        | Ok(0) => (),
        | Ok(n) => log::info!("notified {} observers", n),
        | Err(e) => log::error!("{}", e),
      }
    }

    std::thread::sleep(Duration::from_millis(10));
  }
}
