use std::{cell::RefCell, rc::Rc, time::Duration};

use clap::Parser;
use log::*;
use tokio::{signal::ctrl_c, sync::oneshot, task};

use rebinder::{
	server::serve,
	store::{sweep_task, SeenStore},
};

#[derive(Parser)]
pub struct Args {
	#[clap(short, long, default_value = "0.0.0.0:53")]
	pub listen: String,

	#[clap(long, default_value_t = 1)]
	pub ttl: u32,

	#[clap(long, default_value_t = 3600)]
	pub max_age: u64,
	#[clap(long, default_value_t = 3600)]
	pub sweep_interval: u64,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
	let args = Args::parse();

	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

	let store = Rc::new(RefCell::new(SeenStore::new()));

	let local = task::LocalSet::new();

	let (abort_tx0, abort0) = oneshot::channel();
	let (abort_tx1, abort1) = oneshot::channel();

	local.spawn_local(async move {
		ctrl_c().await.unwrap();
		info!("ctrl-c received, shutting down");
		abort_tx0.send(()).unwrap();
		abort_tx1.send(()).unwrap();
	});
	local.spawn_local(serve(
		abort0,
		args.listen.parse().unwrap(),
		store.clone(),
		args.ttl,
	));
	local.spawn_local(sweep_task(
		abort1,
		store.clone(),
		Duration::from_secs(args.max_age),
		Duration::from_secs(args.sweep_interval),
	));

	local.await;
}
