//! Exposition text shared by tests.

/// A trimmed scrape of the image proxy's `/metrics` endpoint.
pub const PROXY_METRICS: &str = r#"# HELP errors Total errors
# TYPE errors counter
errors 4
# HELP hits Total cache hits
# TYPE hits counter
hits 1520
# HELP cache_metrics Cache metics by cache type
# TYPE cache_metrics gauge
cache_metrics{metric="items",type="memory"} 311
cache_metrics{metric="mem_total_bytes",type="memory"} 50000000
cache_metrics{metric="mem_used_bytes",type="memory"} 12500000
# HELP api_requests Api request by method
# TYPE api_requests counter
api_requests{rpc_method="img_proxy_fetch"} 900
api_requests{rpc_method="img_proxy_describe"} 60
api_requests{rpc_method="img_proxy_report"} 30
api_requests{rpc_method="img_proxy_describe_report"} 10
# HELP api_response_time Api Response Time in milliseconds
# TYPE api_response_time histogram
api_response_time_bucket{method="img_proxy_fetch",le="5"} 400
api_response_time_bucket{method="img_proxy_fetch",le="50"} 800
api_response_time_bucket{method="img_proxy_fetch",le="500"} 880
api_response_time_bucket{method="img_proxy_fetch",le="+Inf"} 900
api_response_time_sum{method="img_proxy_fetch"} 21000
api_response_time_count{method="img_proxy_fetch"} 900
api_response_time_bucket{method="img_proxy_describe",le="5"} 50
api_response_time_bucket{method="img_proxy_describe",le="50"} 60
api_response_time_bucket{method="img_proxy_describe",le="500"} 60
api_response_time_bucket{method="img_proxy_describe",le="+Inf"} 60
api_response_time_sum{method="img_proxy_describe"} 180
api_response_time_count{method="img_proxy_describe"} 60
# HELP document Document status
# TYPE document counter
document{status="fetched"} 700
document{status="forced"} 12
# HELP traffic Traffic in bytes
# TYPE traffic counter
traffic{metric="fetched"} 73400320
traffic{metric="served"} 104857600
# HELP process_cpu_seconds_total Total user and system CPU time spent in seconds.
# TYPE process_cpu_seconds_total counter
process_cpu_seconds_total 12.5
# HELP process_resident_memory_bytes Resident memory size in bytes.
# TYPE process_resident_memory_bytes gauge
process_resident_memory_bytes 48234496
# HELP process_start_time_seconds Start time of the process since unix epoch in seconds.
# TYPE process_start_time_seconds gauge
process_start_time_seconds 1700000000
# HELP process_virtual_memory_bytes Virtual memory size in bytes.
# TYPE process_virtual_memory_bytes gauge
process_virtual_memory_bytes 1073741824
"#;
