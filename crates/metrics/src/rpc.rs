//! Route service request metrics
//!
//! Every call is counted under its `route_*` method, failures additionally under the error kind
//! the pipeline reported (input validation, invariant violation, server side failure or a
//! bundler error passed through). Method names outside the `route` namespace share one label.

use jsonrpsee::{
    helpers::MethodResponseResult, server::middleware::rpc::RpcServiceT, types::Request,
    MethodResponse,
};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use pin_project::pin_project;
use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
    time::Instant,
};
use tower::Layer;

const ROUTE_REQUEST: &str = "autobridge_route_request";
const ROUTE_REQUEST_FAILED: &str = "autobridge_route_request_failed";
const ROUTE_REQUEST_DURATION: &str = "autobridge_route_request_duration_seconds";

const ROUTE_METHODS: [&str; 4] = ["route_health", "route_envCheck", "route_validate", "route_quote"];

/// Label of a method name, `other` outside the route namespace
pub fn method_label(method: &str) -> &'static str {
    ROUTE_METHODS.iter().find(|name| **name == method).copied().unwrap_or("other")
}

/// Error kind of a JSON-RPC error code returned by the route service
pub fn error_kind(code: i32) -> &'static str {
    match code {
        -32700 => "parse",
        -32601 => "method_not_found",
        -32602 => "input_validation",
        -32603 => "invariant_violation",
        -32000 => "server",
        _ => "bundler",
    }
}

/// RPC middleware recording route service calls
#[derive(Clone, Debug, Default)]
pub struct MetricsLayer;

impl MetricsLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for MetricsLayer {
    type Service = RouteMetricsService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RouteMetricsService { inner }
    }
}

#[derive(Clone, Debug)]
pub struct RouteMetricsService<S> {
    inner: S,
}

impl<'a, S> RpcServiceT<'a> for RouteMetricsService<S>
where
    S: RpcServiceT<'a>,
{
    type Future = RouteMetricsFuture<S::Future>;

    fn call(&self, request: Request<'a>) -> Self::Future {
        let method = method_label(request.method_name());
        counter!(ROUTE_REQUEST, "method" => method).increment(1);
        RouteMetricsFuture { fut: self.inner.call(request), method, started: Instant::now() }
    }
}

/// Response future recording the outcome and duration of a call
#[pin_project]
pub struct RouteMetricsFuture<F> {
    #[pin]
    fut: F,
    method: &'static str,
    started: Instant,
}

impl<F> std::fmt::Debug for RouteMetricsFuture<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteMetricsFuture").field("method", &self.method).finish()
    }
}

impl<F: Future<Output = MethodResponse>> Future for RouteMetricsFuture<F> {
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();

        let res = this.fut.poll(cx);
        if let Poll::Ready(rp) = &res {
            let method = *this.method;
            histogram!(ROUTE_REQUEST_DURATION, "method" => method)
                .record(this.started.elapsed().as_secs_f64());
            if let MethodResponseResult::Failed(code) = rp.success_or_error {
                counter!(ROUTE_REQUEST_FAILED, "method" => method, "kind" => error_kind(code))
                    .increment(1);
            }
        }
        res
    }
}

pub fn describe_json_rpc_metrics() {
    describe_counter!(ROUTE_REQUEST, "The number of route service calls per method");
    describe_counter!(
        ROUTE_REQUEST_FAILED,
        "The number of failed route service calls per method and error kind"
    );
    describe_histogram!(ROUTE_REQUEST_DURATION, "Time to answer a route service call in seconds");
    for method in ROUTE_METHODS {
        counter!(ROUTE_REQUEST, "method" => method).absolute(0);
    }
}
