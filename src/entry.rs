use std::{
	fmt::Display,
	net::{Ipv4Addr, Ipv6Addr},
};

// the first label of a query name carries the whole instruction:
//	token
//	token_AABBCCDD
//	token_AABBCCDD_EEFFGGHH
//	token_M_AABBCCDD_EEFFGGHH
// addresses are 32 bit big endian integers in hex, 7f000001 is 127.0.0.1
// the leading token is random filler chosen by the client to defeat
// resolver caches, we never look at it

#[derive(Clone, Copy)]
#[cfg_attr(test, derive(Debug, PartialEq, Eq))]
pub enum Mode {
	Both,
	AOnly,
	AaaaOnly,
}

impl Mode {
	// a single ascii digit 0..2, anything else collapses to Both
	fn parse(s: &str) -> Mode {
		match s.as_bytes() {
			[b'1'] => Mode::AOnly,
			[b'2'] => Mode::AaaaOnly,
			_ => Mode::Both,
		}
	}

	pub fn answers_a(&self) -> bool {
		matches!(self, Mode::Both | Mode::AOnly)
	}

	pub fn answers_aaaa(&self) -> bool {
		matches!(self, Mode::Both | Mode::AaaaOnly)
	}
}

impl Display for Mode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let d = match self {
			Mode::Both => '0',
			Mode::AOnly => '1',
			Mode::AaaaOnly => '2',
		};
		write!(f, "{}", d)
	}
}

#[cfg_attr(test, derive(Debug, PartialEq, Eq))]
pub struct Entry {
	pub mode: Mode,
	pub primary: Option<Ipv4Addr>,
	pub secondary: Option<Ipv4Addr>,
}

pub fn parse_entry(label: &str) -> Entry {
	let parts: Vec<&str> = label.split('_').collect();
	match parts.len() {
		1 => Entry {
			mode: Mode::Both,
			primary: None,
			secondary: None,
		},
		2 => Entry {
			mode: Mode::Both,
			primary: parse_addr(parts[1]),
			secondary: None,
		},
		3 => Entry {
			mode: Mode::Both,
			primary: parse_addr(parts[1]),
			secondary: parse_addr(parts[2]),
		},
		_ => Entry {
			mode: Mode::parse(parts[1]),
			primary: parse_addr(parts[2]),
			secondary: parse_addr(parts[3]),
		},
	}
}

// a bad token is not an error, the entry just loses that address
fn parse_addr(s: &str) -> Option<Ipv4Addr> {
	u32::from_str_radix(s, 16).ok().map(Ipv4Addr::from)
}

// rfc 4291 2.5.5.2, ::ffff:0:0/96
pub fn embed_v4_in_v6(addr: Ipv4Addr) -> Ipv6Addr {
	let mut b = [0u8; 16];
	b[10] = 0xff;
	b[11] = 0xff;
	b[12..].copy_from_slice(&addr.octets());
	Ipv6Addr::from(b)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn token_only() {
		assert_eq!(
			parse_entry("k7sj2q"),
			Entry {
				mode: Mode::Both,
				primary: None,
				secondary: None,
			}
		);
	}

	#[test]
	fn single_address() {
		assert_eq!(
			parse_entry("x_7f000001"),
			Entry {
				mode: Mode::Both,
				primary: Some(Ipv4Addr::new(127, 0, 0, 1)),
				secondary: None,
			}
		);
	}

	#[test]
	fn two_addresses() {
		assert_eq!(
			parse_entry("x_7f000001_c0a80001"),
			Entry {
				mode: Mode::Both,
				primary: Some(Ipv4Addr::new(127, 0, 0, 1)),
				secondary: Some(Ipv4Addr::new(192, 168, 0, 1)),
			}
		);
	}

	#[test]
	fn explicit_mode() {
		for (label, mode) in [
			("x_0_7f000001_c0a80001", Mode::Both),
			("x_1_7f000001_c0a80001", Mode::AOnly),
			("x_2_7f000001_c0a80001", Mode::AaaaOnly),
		] {
			assert_eq!(
				parse_entry(label),
				Entry {
					mode,
					primary: Some(Ipv4Addr::new(127, 0, 0, 1)),
					secondary: Some(Ipv4Addr::new(192, 168, 0, 1)),
				}
			);
		}
	}

	#[test]
	fn bad_mode_digit() {
		// anything that is not exactly one of 0, 1, 2 means Both
		for label in [
			"x_x_7f000001_c0a80001",
			"x_3_7f000001_c0a80001",
			"x_25_7f000001_c0a80001",
			"x__7f000001_c0a80001",
		] {
			assert_eq!(parse_entry(label).mode, Mode::Both);
			assert_eq!(
				parse_entry(label).primary,
				Some(Ipv4Addr::new(127, 0, 0, 1))
			);
		}
	}

	#[test]
	fn bad_address_token() {
		let e = parse_entry("x_zz_c0a80001");
		assert_eq!(e.primary, None);
		assert_eq!(e.secondary, Some(Ipv4Addr::new(192, 168, 0, 1)));

		// 9 hex digits overflow 32 bits
		assert_eq!(parse_entry("x_7f0000010").primary, None);
		assert_eq!(parse_entry("x_").primary, None);
	}

	#[test]
	fn short_hex() {
		// leading zeros are implied
		assert_eq!(
			parse_entry("x_7f").primary,
			Some(Ipv4Addr::new(0, 0, 0, 127))
		);
	}

	#[test]
	fn mode_eligibility() {
		assert!(Mode::Both.answers_a() && Mode::Both.answers_aaaa());
		assert!(Mode::AOnly.answers_a() && !Mode::AOnly.answers_aaaa());
		assert!(!Mode::AaaaOnly.answers_a() && Mode::AaaaOnly.answers_aaaa());
	}

	#[test]
	fn embed() {
		let v6 = embed_v4_in_v6(Ipv4Addr::new(127, 0, 0, 1));
		let o = v6.octets();
		assert_eq!(o.len(), 16);
		assert_eq!(&o[..10], &[0u8; 10]);
		assert_eq!(&o[10..12], &[0xff, 0xff]);
		assert_eq!(&o[12..], &[127, 0, 0, 1]);
		assert_eq!(v6, "::ffff:127.0.0.1".parse::<Ipv6Addr>().unwrap());
	}
}
