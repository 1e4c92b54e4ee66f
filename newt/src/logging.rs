use core::fmt::Write;

use newt_common::Writable;
use newt_msg::Message;
use no_std_net::SocketAddr;

/// One-line description of a datagram for trace logs,
/// formatted without allocating.
///
/// Output that does not fit is cut at the last whole field.
pub(crate) fn msg_summary(msg: &Message<'_>, addr: SocketAddr) -> Writable<128> {
  let mut buf = Writable::<128>::default();
  let code = msg.code.to_human();

  write!(buf,
         "{:?} {}{}{}{} {:?} {:?}",
         msg.ty,
         code[0],
         code[1],
         code[2],
         code[3],
         msg.id,
         msg.token.as_bytes()).ok();

  if !msg.opts.uri_path.is_empty() {
    let mut path = Writable::<48>::default();
    if msg.opts.uri_path.write_joined(&mut path, '/').is_ok() {
      write!(buf, " /{}", path).ok();
    }
  }

  write!(buf, " {}b payload", msg.payload.0.len()).ok();
  write!(buf, " ({})", addr).ok();
  buf
}
