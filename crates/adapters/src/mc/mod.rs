// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mitsubishi MC (Qna-3E binary) adapter.
//!
//! Word families (`i16`/`i32`/`f32`/`f32_swapped`) cluster contiguous
//! register ranges per prefix; booleans group by prefix then contiguous
//! bit address; strings and hex words read individually. A failed batch
//! falls back to point-by-point reads for that group.

mod frame;

pub use frame::{parse_address, DeviceSpec, BIT_READ_CAP, WORD_READ_CAP};

use crate::grouper::{group_contiguous, GroupItem};
use crate::{Adapter, AdapterError};
use acqd_core::{
    scale_float, scale_integer, Clock, Device, Point, PointType, Reading, SystemClock, Value,
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// One 3E read request plus the points it serves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct McRequest {
    pub spec: DeviceSpec,
    pub head: u32,
    pub count: u16,
    /// `(point index, unit offset within the request)`.
    pub slots: Vec<(usize, u16)>,
    pub bits: bool,
}

#[derive(Debug, Default)]
pub(crate) struct McPlan {
    pub rejected: Vec<(usize, String)>,
    pub requests: Vec<McRequest>,
}

fn type_rank(point_type: PointType) -> u8 {
    match point_type {
        PointType::I16 => 0,
        PointType::I32 => 1,
        PointType::F32 => 2,
        PointType::F32Swapped => 3,
        PointType::Bool => 4,
        PointType::Str => 5,
        PointType::HexU32 => 6,
    }
}

/// Pure planning stage.
pub(crate) fn build_plan(points: &[Point]) -> McPlan {
    let mut plan = McPlan::default();
    // Contiguous clustering only applies within one prefix and one type
    // family; everything else becomes a single-slot request.
    let mut word_families: BTreeMap<(char, u8), (DeviceSpec, Vec<GroupItem>)> = BTreeMap::new();
    let mut bit_families: BTreeMap<char, (DeviceSpec, Vec<GroupItem>)> = BTreeMap::new();
    let mut singles: Vec<(usize, DeviceSpec, u32, u16)> = Vec::new();

    for (index, point) in points.iter().enumerate() {
        let address = point.address.to_string();
        let (spec, offset) = match parse_address(&address) {
            Ok(parsed) => parsed,
            Err(e) => {
                plan.rejected.push((index, e));
                continue;
            }
        };

        if spec.is_bit {
            if point.point_type != PointType::Bool {
                plan.rejected.push((
                    index,
                    format!(
                        "type {} is not readable from bit register '{}'",
                        point.point_type, address
                    ),
                ));
                continue;
            }
            bit_families
                .entry(spec.prefix)
                .or_insert_with(|| (spec, Vec::new()))
                .1
                .push(GroupItem::new(index, u64::from(offset), point.length.max(1)));
            continue;
        }

        match point.point_type {
            PointType::I16 | PointType::I32 | PointType::F32 | PointType::F32Swapped => {
                word_families
                    .entry((spec.prefix, type_rank(point.point_type)))
                    .or_insert_with(|| (spec, Vec::new()))
                    .1
                    .push(GroupItem::new(
                        index,
                        u64::from(offset),
                        point.register_span(),
                    ));
            }
            PointType::Bool => singles.push((index, spec, offset, 1)),
            PointType::Str => singles.push((index, spec, offset, point.length.max(1) as u16)),
            PointType::HexU32 => singles.push((index, spec, offset, 2)),
        }
    }

    for ((_, _), (spec, items)) in word_families {
        for group in group_contiguous(&items, WORD_READ_CAP) {
            plan.requests.push(McRequest {
                spec,
                head: group.start as u32,
                count: group.span() as u16,
                slots: group
                    .items
                    .iter()
                    .map(|item| (item.index, (item.address - group.start) as u16))
                    .collect(),
                bits: false,
            });
        }
    }
    for (index, spec, head, count) in singles {
        plan.requests.push(McRequest {
            spec,
            head,
            count,
            slots: vec![(index, 0)],
            bits: false,
        });
    }
    for (_, (spec, items)) in bit_families {
        for group in group_contiguous(&items, BIT_READ_CAP) {
            plan.requests.push(McRequest {
                spec,
                head: group.start as u32,
                count: group.span() as u16,
                slots: group
                    .items
                    .iter()
                    .map(|item| (item.index, (item.address - group.start) as u16))
                    .collect(),
                bits: true,
            });
        }
    }
    plan
}

/// Decode one word-family point from its word slice.
pub(crate) fn decode_words(point: &Point, words: &[u16]) -> Result<Value, String> {
    let span = point.register_span() as usize;
    if words.len() < span {
        return Err(format!(
            "expected {} words for {}, got {}",
            span,
            point.point_type,
            words.len()
        ));
    }
    let words = &words[..span];

    let value = match point.point_type {
        PointType::I16 => scale_integer(
            i64::from(words[0] as i16),
            point.coefficient,
            point.precision,
        ),
        PointType::I32 => {
            let raw = word_pair_u32(words) as i32;
            scale_float(f64::from(raw), point.coefficient, point.precision)
        }
        PointType::F32 => {
            let raw = f32::from_bits(word_pair_u32(words));
            scale_float(f64::from(raw), point.coefficient, point.precision)
        }
        PointType::F32Swapped => {
            // The two 16-bit halves arrive rotated; undo before the
            // IEEE-754 interpretation.
            let raw = f32::from_bits(word_pair_u32(words).rotate_left(16));
            scale_float(f64::from(raw), point.coefficient, point.precision)
        }
        PointType::Bool => Value::Bool(words[0] != 0),
        PointType::Str => {
            let mut bytes = Vec::with_capacity(words.len() * 2);
            for &word in words {
                bytes.push((word & 0xff) as u8);
                bytes.push((word >> 8) as u8);
            }
            Value::Str(
                String::from_utf8_lossy(&bytes)
                    .trim_matches(['\0', ' '])
                    .to_string(),
            )
        }
        PointType::HexU32 => Value::Str(format!("{:#x}", word_pair_u32(words))),
    };
    Ok(value)
}

/// Melsec words are little-endian pairs: low word first.
fn word_pair_u32(words: &[u16]) -> u32 {
    u32::from(words[0]) | (u32::from(words[1]) << 16)
}

/// Mitsubishi MC driver for one device.
#[derive(Debug)]
pub struct McAdapter {
    host: String,
    port: u16,
    timeout: Duration,
    stream: Option<TcpStream>,
}

impl McAdapter {
    pub fn new(device: &Device, timeout: Duration) -> Self {
        Self {
            host: device.host.clone(),
            port: device.port,
            timeout,
            stream: None,
        }
    }

    /// One request/response exchange; returns the response data bytes.
    async fn transact(&mut self, request: &[u8]) -> Result<Vec<u8>, String> {
        let stream = self.stream.as_mut().ok_or("not connected")?;

        let exchange = async {
            stream.write_all(request).await?;
            let mut header = [0u8; frame::RESPONSE_HEADER_LEN];
            stream.read_exact(&mut header).await?;
            let body_len = frame::response_body_len(&header)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
            let mut body = vec![0u8; body_len];
            stream.read_exact(&mut body).await?;
            Ok::<Vec<u8>, std::io::Error>(body)
        };

        let body = match tokio::time::timeout(self.timeout, exchange).await {
            Ok(Ok(body)) => body,
            Ok(Err(e)) => {
                // Stream state is unknown after an I/O error.
                self.stream = None;
                return Err(format!("transport error: {}", e));
            }
            Err(_) => {
                self.stream = None;
                return Err(format!("read timed out after {:?}", self.timeout));
            }
        };
        frame::response_data(&body).map(<[u8]>::to_vec)
    }

    async fn read_words(&mut self, spec: DeviceSpec, head: u32, count: u16) -> Result<Vec<u16>, String> {
        let request = frame::build_word_read(spec, head, count);
        let data = self.transact(&request).await?;
        Ok(frame::words_from_bytes(&data))
    }

    async fn read_bits(&mut self, spec: DeviceSpec, head: u32, count: u16) -> Result<Vec<bool>, String> {
        let request = frame::build_bit_read(spec, head, count);
        let data = self.transact(&request).await?;
        Ok(frame::bits_from_bytes(&data, usize::from(count)))
    }

    /// Issue one planned request; on batch failure fall back to
    /// point-by-point reads.
    async fn execute_request(
        &mut self,
        request: &McRequest,
        points: &[Point],
        readings: &mut Vec<Reading>,
        now_ns: i64,
    ) {
        if request.bits {
            match self.read_bits(request.spec, request.head, request.count).await {
                Ok(bits) => {
                    for &(index, offset) in &request.slots {
                        let point = &points[index];
                        let value = bits
                            .get(usize::from(offset))
                            .map(|&b| Value::Bool(b))
                            .ok_or_else(|| "short bit response".to_string());
                        readings.push(match value {
                            Ok(v) => Reading::good(&point.code, v, now_ns),
                            Err(e) => Reading::bad(&point.code, e, now_ns),
                        });
                    }
                }
                Err(batch_error) => {
                    tracing::warn!(
                        prefix = %request.spec.prefix,
                        head = request.head,
                        count = request.count,
                        error = %batch_error,
                        "mc bit batch failed, falling back to single reads"
                    );
                    for &(index, offset) in &request.slots {
                        let point = &points[index];
                        let head = request.head + u32::from(offset);
                        readings.push(
                            match self.read_bits(request.spec, head, 1).await {
                                Ok(bits) if !bits.is_empty() => {
                                    Reading::good(&point.code, Value::Bool(bits[0]), now_ns)
                                }
                                Ok(_) => Reading::bad(&point.code, "empty bit response", now_ns),
                                Err(e) => Reading::bad(&point.code, e, now_ns),
                            },
                        );
                    }
                }
            }
            return;
        }

        match self.read_words(request.spec, request.head, request.count).await {
            Ok(words) => {
                for &(index, offset) in &request.slots {
                    let point = &points[index];
                    let slice = words.get(usize::from(offset)..).unwrap_or(&[]);
                    readings.push(match decode_words(point, slice) {
                        Ok(value) => Reading::good(&point.code, value, now_ns),
                        Err(e) => Reading::bad(&point.code, e, now_ns),
                    });
                }
            }
            Err(batch_error) => {
                if request.slots.len() > 1 {
                    tracing::warn!(
                        prefix = %request.spec.prefix,
                        head = request.head,
                        count = request.count,
                        error = %batch_error,
                        "mc word batch failed, falling back to single reads"
                    );
                }
                for &(index, offset) in &request.slots {
                    let point = &points[index];
                    if request.slots.len() == 1 {
                        readings.push(Reading::bad(&point.code, batch_error.clone(), now_ns));
                        continue;
                    }
                    let head = request.head + u32::from(offset);
                    let count = point.register_span() as u16;
                    readings.push(match self.read_words(request.spec, head, count).await {
                        Ok(words) => match decode_words(point, &words) {
                            Ok(value) => Reading::good(&point.code, value, now_ns),
                            Err(e) => Reading::bad(&point.code, e, now_ns),
                        },
                        Err(e) => Reading::bad(&point.code, e, now_ns),
                    });
                }
            }
        }
    }
}

#[async_trait]
impl Adapter for McAdapter {
    async fn connect(&mut self) -> Result<(), AdapterError> {
        if self.stream.is_some() {
            return Ok(());
        }
        let target = format!("{}:{}", self.host, self.port);
        let stream = tokio::time::timeout(self.timeout, TcpStream::connect(&target))
            .await
            .map_err(|_| AdapterError::Connection(format!("connect to {} timed out", target)))?
            .map_err(|e| AdapterError::Connection(format!("connect to {}: {}", target, e)))?;
        stream
            .set_nodelay(true)
            .map_err(|e| AdapterError::Connection(format!("set_nodelay: {}", e)))?;
        self.stream = Some(stream);
        tracing::info!(host = %self.host, port = self.port, "mc connected");
        Ok(())
    }

    async fn read_points(&mut self, points: &[Point]) -> Result<Vec<Reading>, AdapterError> {
        if self.stream.is_none() {
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
        if self.stream.is_none() {
            return false;
        }
        match parse_address("D0") {
            Ok((spec, head)) => self.read_words(spec, head, 1).await.is_ok(),
            Err(_) => false,
        }
    }

    async fn disconnect(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.shutdown().await;
            tracing::info!(host = %self.host, port = self.port, "mc disconnected");
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
