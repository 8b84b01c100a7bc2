// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Modbus-TCP adapter.
//!
//! Points are normalized from display addresses, clustered per function
//! code into contiguous batch reads, and decoded per point type. A
//! transport error on a group marks every point in that group bad; the
//! grouper already caps group sizes, so there is no single-point
//! fallback here.

mod addr;
mod decode;

pub use addr::{normalize, Family, WireAddress};
pub use decode::{decode_bits, decode_registers};

use crate::grouper::{group_contiguous, GroupItem};
use crate::{Adapter, AdapterError};
use acqd_core::{Clock, Device, Point, Reading, SystemClock};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::lookup_host;
use tokio_modbus::client::{tcp, Context, Reader};
use tokio_modbus::slave::Slave;

/// One wire request plus the points it serves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PlannedRequest {
    pub family: Family,
    pub start: u16,
    pub count: u16,
    /// `(point index, register offset within the request)`.
    pub slots: Vec<(usize, u16)>,
}

/// Result of turning a point slice into wire requests.
#[derive(Debug, Default)]
pub(crate) struct ReadPlan {
    /// Points rejected before grouping, with the decode error.
    pub rejected: Vec<(usize, String)>,
    pub requests: Vec<PlannedRequest>,
}

/// Pure planning stage: normalize addresses, partition by function
/// code, cluster contiguous runs under the per-family transport cap.
pub(crate) fn build_plan(points: &[Point]) -> ReadPlan {
    let mut plan = ReadPlan::default();
    let mut families: BTreeMap<Family, Vec<GroupItem>> = BTreeMap::new();

    for (index, point) in points.iter().enumerate() {
        let display = match point.address.as_integer() {
            Some(n) => n,
            None => {
                plan.rejected.push((
                    index,
                    format!("address '{}' is not numeric", point.address),
                ));
                continue;
            }
        };
        let wire = match normalize(display) {
            Ok(wire) => wire,
            Err(e) => {
                plan.rejected.push((index, e));
                continue;
            }
        };
        let span = if wire.family.is_bit() {
            point.length.max(1)
        } else {
            point.register_span()
        };
        families
            .entry(wire.family)
            .or_default()
            .push(GroupItem::new(index, u64::from(wire.offset), span));
    }

    for (family, items) in families {
        for group in group_contiguous(&items, family.read_cap()) {
            plan.requests.push(PlannedRequest {
                family,
                start: group.start as u16,
                count: group.span() as u16,
                slots: group
                    .items
                    .iter()
                    .map(|item| (item.index, (item.address - group.start) as u16))
                    .collect(),
            });
        }
    }
    plan
}

/// Modbus-TCP driver for one device.
#[derive(Debug)]
pub struct ModbusAdapter {
    host: String,
    port: u16,
    slave: Slave,
    timeout: Duration,
    ctx: Option<Context>,
}

impl ModbusAdapter {
    pub fn new(device: &Device, timeout: Duration) -> Self {
        Self {
            host: device.host.clone(),
            port: device.port,
            slave: Slave(device.slave.unwrap_or(1)),
            timeout,
            ctx: None,
        }
    }

    async fn resolve(host: &str, port: u16) -> Result<SocketAddr, AdapterError> {
        let target = format!("{}:{}", host, port);
        let result = lookup_host(&target)
            .await
            .map_err(|e| AdapterError::Connection(format!("resolve {}: {}", target, e)))?
            .next()
            .ok_or_else(|| AdapterError::Connection(format!("no address for {}", target)));
        result
    }

    /// Issue one planned request and distribute the response (or the
    /// group error) onto the readings vector.
    async fn execute_request(
        &mut self,
        request: &PlannedRequest,
        points: &[Point],
        readings: &mut Vec<Reading>,
        now_ns: i64,
    ) {
        let ctx = match self.ctx.as_mut() {
            Some(ctx) => ctx,
            None => {
                fail_group(request, points, readings, now_ns, "not connected");
                return;
            }
        };

        match request.family {
            Family::Holding | Family::Input => {
                let call = async {
                    if request.family == Family::Holding {
                        ctx.read_holding_registers(request.start, request.count).await
                    } else {
                        ctx.read_input_registers(request.start, request.count).await
                    }
                };
                match tokio::time::timeout(self.timeout, call).await {
                    Ok(Ok(Ok(words))) => {
                        for &(index, offset) in &request.slots {
                            let point = &points[index];
                            let slice = words.get(offset as usize..).unwrap_or(&[]);
                            readings.push(match decode_registers(point, slice) {
                                Ok(value) => Reading::good(&point.code, value, now_ns),
                                Err(e) => Reading::bad(&point.code, e, now_ns),
                            });
                        }
                    }
                    Ok(Ok(Err(exception))) => {
                        fail_group(
                            request,
                            points,
                            readings,
                            now_ns,
                            &format!("modbus exception: {}", exception),
                        );
                    }
                    Ok(Err(e)) => {
                        fail_group(
                            request,
                            points,
                            readings,
                            now_ns,
                            &format!("transport error: {}", e),
                        );
                        self.ctx = None;
                    }
                    Err(_) => {
                        fail_group(
                            request,
                            points,
                            readings,
                            now_ns,
                            &format!("read timed out after {:?}", self.timeout),
                        );
                    }
                }
            }
            Family::Coil | Family::Discrete => {
                let call = async {
                    if request.family == Family::Coil {
                        ctx.read_coils(request.start, request.count).await
                    } else {
                        ctx.read_discrete_inputs(request.start, request.count).await
                    }
                };
                match tokio::time::timeout(self.timeout, call).await {
                    Ok(Ok(Ok(bits))) => {
                        for &(index, offset) in &request.slots {
                            let point = &points[index];
                            let slice = bits.get(offset as usize..).unwrap_or(&[]);
                            readings.push(match decode_bits(point, slice) {
                                Ok(value) => Reading::good(&point.code, value, now_ns),
                                Err(e) => Reading::bad(&point.code, e, now_ns),
                            });
                        }
                    }
                    Ok(Ok(Err(exception))) => {
                        fail_group(
                            request,
                            points,
                            readings,
                            now_ns,
                            &format!("modbus exception: {}", exception),
                        );
                    }
                    Ok(Err(e)) => {
                        fail_group(
                            request,
                            points,
                            readings,
                            now_ns,
                            &format!("transport error: {}", e),
                        );
                        self.ctx = None;
                    }
                    Err(_) => {
                        fail_group(
                            request,
                            points,
                            readings,
                            now_ns,
                            &format!("read timed out after {:?}", self.timeout),
                        );
                    }
                }
            }
        }
    }
}

fn fail_group(
    request: &PlannedRequest,
    points: &[Point],
    readings: &mut Vec<Reading>,
    now_ns: i64,
    error: &str,
) {
    for &(index, _) in &request.slots {
        readings.push(Reading::bad(&points[index].code, error, now_ns));
    }
}

#[async_trait]
impl Adapter for ModbusAdapter {
    async fn connect(&mut self) -> Result<(), AdapterError> {
        if self.ctx.is_some() {
            return Ok(());
        }
        let addr = Self::resolve(&self.host, self.port).await?;
        let connect = tcp::connect_slave(addr, self.slave);
        let ctx = tokio::time::timeout(self.timeout, connect)
            .await
            .map_err(|_| {
                AdapterError::Connection(format!("connect to {} timed out", addr))
            })?
            .map_err(|e| AdapterError::Connection(format!("connect to {}: {}", addr, e)))?;
        self.ctx = Some(ctx);
        tracing::info!(host = %self.host, port = self.port, "modbus connected");
        Ok(())
    }

    async fn read_points(&mut self, points: &[Point]) -> Result<Vec<Reading>, AdapterError> {
        if self.ctx.is_none() {
            self.connect()
                .await
                .map_err(|e| AdapterError::Read(format!("not connected: {}", e)))?;
        }

        let now_ns = SystemClock.now_ns();
        let plan = build_plan(points);
        let mut readings = Vec::with_capacity(points.len());

        for (index, error) in &plan.rejected {
            readings.push(Reading::bad(&points[*index].code, error.clone(), now_ns));
        }
        for request in &plan.requests {
            self.execute_request(request, points, &mut readings, now_ns).await;
        }
        Ok(readings)
    }

    async fn health(&mut self) -> bool {
        let ctx = match self.ctx.as_mut() {
            Some(ctx) => ctx,
            None => return false,
        };
        let probe = ctx.read_holding_registers(0, 1);
        matches!(
            tokio::time::timeout(self.timeout, probe).await,
            Ok(Ok(Ok(_)))
        )
    }

    async fn disconnect(&mut self) {
        if let Some(mut ctx) = self.ctx.take() {
            let _ = ctx.disconnect().await;
            tracing::info!(host = %self.host, port = self.port, "modbus disconnected");
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
