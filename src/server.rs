use std::{
	cell::RefCell,
	net::{Ipv4Addr, SocketAddr},
	rc::Rc,
};

use hickory_proto::{
	op::{Header, Message, MessageType, Query, ResponseCode},
	rr::{
		rdata::{a::A, aaaa::AAAA},
		DNSClass, RData, Record, RecordType,
	},
};
use log::*;
use tokio::{net::UdpSocket, select, sync::oneshot, task};

use crate::{
	entry::{embed_v4_in_v6, parse_entry},
	store::{Observation, SeenStore},
};

// returned whenever the label carries no decodable address
pub const FALLBACK_ADDR: Ipv4Addr = Ipv4Addr::new(1, 3, 3, 7);

pub async fn serve(
	mut quit_signal: oneshot::Receiver<()>,
	listen: SocketAddr,
	store: Rc<RefCell<SeenStore>>,
	ttl: u32,
) {
	let s = Rc::new(UdpSocket::bind(listen).await.unwrap());
	info!("listening on UDP {}", s.local_addr().unwrap());

	let mut buf = vec![0u8; 0x600];
	loop {
		select! {
			r = s.recv_from(&mut buf) => {
				match r {
					Ok((len, addr)) => {
						trace!("udp recv {} bytes from {}", len, addr);
						let q_buf = buf[..len].to_vec();
						task::spawn_local(handle(s.clone(), q_buf, addr, store.clone(), ttl));
					}
					Err(e) => {
						error!("udp recv error: {}", e);
						break;
					}
				}
			}
			_ = &mut quit_signal => {
				info!("exiting");
				break;
			}
		}
	}
}

async fn handle(
	s: Rc<UdpSocket>,
	q_buf: Vec<u8>,
	addr: SocketAddr,
	store: Rc<RefCell<SeenStore>>,
	ttl: u32,
) {
	let resp = match resolve(&q_buf, &store, ttl) {
		Some(v) => v,
		_ => return,
	};
	match s.send_to(&resp, addr).await {
		Ok(len) => {
			trace!("udp send {} bytes to {}", len, addr);
		}
		Err(e) => {
			error!("udp send error: {}", e);
		}
	}
}

fn resolve(q_buf: &[u8], store: &RefCell<SeenStore>, ttl: u32) -> Option<Vec<u8>> {
	let req = Message::from_vec(q_buf)
		.map_err(|e| error!("parse error: {}", e))
		.ok()?;
	trace!("dns query: {}", req);

	let qh = req.header();
	let mut h = Header::response_from_request(qh);

	if qh.message_type() != MessageType::Query || qh.query_count() != 1 {
		debug!(
			"expecting query, got {}, query count {}",
			qh.message_type(),
			qh.query_count()
		);
		h.set_response_code(ResponseCode::FormErr);
		return mk_resp(h, None, None);
	}

	let q = req.queries().first()?;

	if q.query_class() != DNSClass::IN
		|| (q.query_type() != RecordType::A && q.query_type() != RecordType::AAAA)
	{
		info!("unsupported query: {} {}", q.query_class(), q.query_type());
		h.set_response_code(ResponseCode::NotImp);
		return mk_resp(h, Some(q), None);
	}

	let name = q.name().to_ascii();
	let entry = parse_entry(name.split('.').next().unwrap_or(""));

	// note: a name with two addresses hits the store even when the mode
	// ends up suppressing the answer, the observation still counts
	let addr = match (entry.primary, entry.secondary) {
		(None, _) => FALLBACK_ADDR,
		(Some(primary), None) => primary,
		(Some(primary), Some(secondary)) => {
			match store.borrow_mut().observe_or_recall(&name) {
				Observation::First => primary,
				Observation::Repeat => secondary,
			}
		}
	};

	let answer = match q.query_type() {
		RecordType::A if entry.mode.answers_a() => {
			info!("{} A (mode {}), replying with {}", name, entry.mode, addr);
			Some(mk_record(q, ttl, RData::A(A(addr))))
		}
		RecordType::AAAA if entry.mode.answers_aaaa() => {
			let addr = embed_v4_in_v6(addr);
			info!("{} AAAA (mode {}), replying with {}", name, entry.mode, addr);
			Some(mk_record(q, ttl, RData::AAAA(AAAA(addr))))
		}
		_ => {
			info!(
				"{} {} (mode {}), replying with empty response",
				name,
				q.query_type(),
				entry.mode
			);
			None
		}
	};

	mk_resp(h, Some(q), answer)
}

fn mk_record(q: &Query, ttl: u32, rdata: RData) -> Record {
	let mut r = Record::with(q.name().to_owned(), q.query_type(), ttl);
	r.set_data(Some(rdata));
	r
}

fn mk_resp(header: Header, q: Option<&Query>, answer: Option<Record>) -> Option<Vec<u8>> {
	let mut resp = Message::new();
	resp.set_header(header);
	if let Some(q) = q {
		resp.add_query(q.to_owned());
	}
	if let Some(a) = answer {
		resp.add_answer(a);
	}
	trace!("dns response: {}", resp);
	resp.to_vec()
		.map_err(|e| error!("dns response encode error: {}", e))
		.ok()
}
