//! Format-driven conversion dispatcher.
//!
//! A conversion is identified by a [`ConversionKey`]: source format,
//! destination format, matrix kind and direction. Resolution tries, in order:
//!
//! 1. the static route, chosen from the matrix type alone (same-format
//!    copies, monomorphised per format);
//! 2. the runtime table, if the configuration allows it;
//!
//! and reports [`ErrorCode::UnsupportedConversion`](crate::ErrorCode::UnsupportedConversion)
//! when neither applies. Dimensions are checked before any routine runs, so a
//! failed conversion never writes to its destination.

use crate::config::ConvertConfig;
use crate::convert::image::{ImageView, ImageViewMut};
use crate::convert::rows;
use crate::error::{Result, SnapError};
use crate::matrix::{
    Bgr24, Bgra32, Format, FormatTag, Grey8, MatrixKind, MatrixStorage, MatrixView, MatrixViewMut,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Routine filling a matrix view of `F` from an external image.
pub type LoadFn<F> = fn(&ImageView<'_>, &mut MatrixViewMut<'_, F>, &ConvertConfig) -> Result<()>;

/// Routine draining a matrix view of `F` into an external image.
pub type StoreFn<F> = fn(&MatrixView<'_, F>, &mut ImageViewMut<'_>, &ConvertConfig) -> Result<()>;

/// Direction of a conversion relative to the matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// External image into a matrix.
    Load,
    /// Matrix into an external image.
    Store,
}

/// Runtime identity of a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversionKey {
    /// Format data is read from.
    pub source: FormatTag,
    /// Format data is written as.
    pub destination: FormatTag,
    /// Kind of the matrix on either end.
    pub kind: MatrixKind,
    /// Whether the matrix is the destination or the source.
    pub direction: Direction,
}

impl ConversionKey {
    /// Key of a load from a `source` image into a `destination` matrix.
    pub const fn load(source: FormatTag, destination: FormatTag, kind: MatrixKind) -> Self {
        Self {
            source,
            destination,
            kind,
            direction: Direction::Load,
        }
    }

    /// Key of a store from a `source` matrix into a `destination` image.
    pub const fn store(source: FormatTag, destination: FormatTag, kind: MatrixKind) -> Self {
        Self {
            source,
            destination,
            kind,
            direction: Direction::Store,
        }
    }
}

impl fmt::Display for ConversionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} {} -> {} ({:?} matrix)",
            self.direction, self.source, self.destination, self.kind
        )
    }
}

/// A registered routine, tagged by matrix format and direction.
#[derive(Clone, Copy)]
pub enum Routine {
    /// Load into a [`Grey8`] matrix.
    LoadGrey8(LoadFn<Grey8>),
    /// Load into a [`Bgr24`] matrix.
    LoadBgr24(LoadFn<Bgr24>),
    /// Load into a [`Bgra32`] matrix.
    LoadBgra32(LoadFn<Bgra32>),
    /// Store from a [`Grey8`] matrix.
    StoreGrey8(StoreFn<Grey8>),
    /// Store from a [`Bgr24`] matrix.
    StoreBgr24(StoreFn<Bgr24>),
    /// Store from a [`Bgra32`] matrix.
    StoreBgra32(StoreFn<Bgra32>),
}

impl fmt::Debug for Routine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Routine::LoadGrey8(_) => "LoadGrey8",
            Routine::LoadBgr24(_) => "LoadBgr24",
            Routine::LoadBgra32(_) => "LoadBgra32",
            Routine::StoreGrey8(_) => "StoreGrey8",
            Routine::StoreBgr24(_) => "StoreBgr24",
            Routine::StoreBgra32(_) => "StoreBgra32",
        };
        f.write_str(name)
    }
}

/// How a conversion was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Route {
    /// Chosen from the matrix type at compile time.
    Static,
    /// Looked up in the runtime table.
    Runtime,
}

/// Static load route for a matrix of `F` fed from a `source` image.
pub const fn static_load_route<F: Format>(source: FormatTag) -> Option<LoadFn<F>> {
    if source as u8 == F::TAG as u8 {
        Some(rows::load_same::<F>)
    } else {
        None
    }
}

/// Static store route for a matrix of `F` drained into a `destination` image.
pub const fn static_store_route<F: Format>(destination: FormatTag) -> Option<StoreFn<F>> {
    if destination as u8 == F::TAG as u8 {
        Some(rows::store_same::<F>)
    } else {
        None
    }
}

/// Resolves and runs conversions between external images and matrices.
#[derive(Debug, Clone)]
pub struct ConversionDispatcher {
    routes: HashMap<ConversionKey, Routine>,
    config: ConvertConfig,
}

impl Default for ConversionDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversionDispatcher {
    /// A dispatcher with the built-in cross-format routines and default config.
    pub fn new() -> Self {
        Self::with_config(ConvertConfig::default())
    }

    /// A dispatcher with the built-in cross-format routines.
    pub fn with_config(config: ConvertConfig) -> Self {
        let mut dispatcher = Self::empty_with_config(config);
        dispatcher.register_cross_format::<Grey8>();
        dispatcher.register_cross_format::<Bgr24>();
        dispatcher.register_cross_format::<Bgra32>();
        tracing::debug!(routes = dispatcher.routes.len(), "conversion table built");
        dispatcher
    }

    /// A dispatcher with an empty runtime table; only static routes resolve.
    pub fn empty() -> Self {
        Self::empty_with_config(ConvertConfig::default())
    }

    /// An empty runtime table with `config`.
    pub fn empty_with_config(config: ConvertConfig) -> Self {
        Self {
            routes: HashMap::new(),
            config,
        }
    }

    fn register_cross_format<F: Format>(&mut self) {
        for kind in [MatrixKind::Fixed, MatrixKind::Dynamic] {
            for other in FormatTag::ALL.into_iter().filter(|&tag| tag != F::TAG) {
                self.register_load::<F>(other, kind, rows::load_converted::<F>);
                self.register_store::<F>(other, kind, rows::store_converted::<F>);
            }
        }
    }

    /// Conversion settings in use.
    pub fn config(&self) -> &ConvertConfig {
        &self.config
    }

    /// Replace the conversion settings.
    pub fn set_config(&mut self, config: ConvertConfig) {
        self.config = config;
    }

    /// Number of runtime routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether the runtime table is empty.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Whether a runtime route is registered for `key`.
    pub fn contains(&self, key: &ConversionKey) -> bool {
        self.routes.contains_key(key)
    }

    /// Register a runtime routine loading `source` images into `kind`
    /// matrices of `F`. Returns the routine it replaced, if any.
    pub fn register_load<F: Format>(
        &mut self,
        source: FormatTag,
        kind: MatrixKind,
        routine: LoadFn<F>,
    ) -> Option<Routine> {
        let key = ConversionKey::load(source, F::TAG, kind);
        self.routes.insert(key, F::load_routine(routine))
    }

    /// Register a runtime routine storing `kind` matrices of `F` into
    /// `destination` images. Returns the routine it replaced, if any.
    pub fn register_store<F: Format>(
        &mut self,
        destination: FormatTag,
        kind: MatrixKind,
        routine: StoreFn<F>,
    ) -> Option<Routine> {
        let key = ConversionKey::store(F::TAG, destination, kind);
        self.routes.insert(key, F::store_routine(routine))
    }

    /// Resolve the load routine for matrices of type `M` fed from `source`.
    pub fn resolve_load<M: MatrixStorage>(
        &self,
        source: FormatTag,
    ) -> Result<(Route, LoadFn<M::Format>)> {
        if let Some(routine) = static_load_route::<M::Format>(source) {
            return Ok((Route::Static, routine));
        }
        let key = ConversionKey::load(source, <M::Format as Format>::TAG, M::KIND);
        self.lookup(&key, <M::Format as Format>::as_load_routine)
            .map(|routine| (Route::Runtime, routine))
    }

    /// Resolve the store routine for matrices of type `M` drained into `destination`.
    pub fn resolve_store<M: MatrixStorage>(
        &self,
        destination: FormatTag,
    ) -> Result<(Route, StoreFn<M::Format>)> {
        if let Some(routine) = static_store_route::<M::Format>(destination) {
            return Ok((Route::Static, routine));
        }
        let key = ConversionKey::store(<M::Format as Format>::TAG, destination, M::KIND);
        self.lookup(&key, <M::Format as Format>::as_store_routine)
            .map(|routine| (Route::Runtime, routine))
    }

    fn lookup<R>(&self, key: &ConversionKey, unwrap: fn(&Routine) -> Option<R>) -> Result<R> {
        if !self.config.allows_runtime_routes() {
            return Err(SnapError::unsupported_conversion(format!(
                "{}: no static route and runtime routes are disabled",
                key
            )));
        }
        self.routes
            .get(key)
            .and_then(unwrap)
            .ok_or_else(|| SnapError::unsupported_conversion(format!("{}: no route", key)))
    }

    /// Fill `dst` from `src`.
    pub fn load<M: MatrixStorage>(&self, src: &ImageView<'_>, dst: &mut M) -> Result<Route> {
        let (route, routine) = self.resolve_load::<M>(src.format())?;

        let channels = <M::Format as Format>::CHANNELS;
        let needed_cols = src.cols() * channels;
        if dst.rows() < src.rows() || dst.cols() < needed_cols {
            return Err(SnapError::size_mismatch(format!(
                "{} x {} {} image needs a matrix of at least {} x {}, got {} x {}",
                src.rows(),
                src.cols(),
                src.format(),
                src.rows(),
                needed_cols,
                dst.rows(),
                dst.cols()
            )));
        }

        let (to, kind) = (<M::Format as Format>::TAG, M::KIND);
        tracing::debug!(
            from = %src.format(),
            to = %to,
            kind = ?kind,
            route = ?route,
            rows = src.rows(),
            cols = src.cols(),
            "load"
        );
        routine(src, &mut dst.view_mut(), &self.config)?;
        Ok(route)
    }

    /// Drain `src` into `dst`.
    pub fn store<M: MatrixStorage>(&self, src: &M, dst: &mut ImageViewMut<'_>) -> Result<Route> {
        let (route, routine) = self.resolve_store::<M>(dst.format())?;

        let view = src.view();
        if dst.rows() < view.rows() || dst.cols() < view.pixels_per_row() {
            return Err(SnapError::size_mismatch(format!(
                "{} x {} pixel matrix does not fit a {} x {} image",
                view.rows(),
                view.pixels_per_row(),
                dst.rows(),
                dst.cols()
            )));
        }

        let (from, kind) = (<M::Format as Format>::TAG, M::KIND);
        tracing::debug!(
            from = %from,
            to = %dst.format(),
            kind = ?kind,
            route = ?route,
            rows = view.rows(),
            cols = view.pixels_per_row(),
            "store"
        );
        routine(&view, dst, &self.config)?;
        Ok(route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::ImageBuffer;
    use crate::error::ErrorCode;
    use crate::matrix::DynamicMatrix;

    fn fail_load(
        _: &ImageView<'_>,
        _: &mut MatrixViewMut<'_, Grey8>,
        _: &ConvertConfig,
    ) -> Result<()> {
        Err(SnapError::invalid_argument("custom routine ran"))
    }

    #[test]
    fn test_builtin_table() {
        let dispatcher = ConversionDispatcher::new();
        // 3 formats x 2 others x 2 kinds x 2 directions
        assert_eq!(dispatcher.len(), 24);
        assert!(dispatcher.contains(&ConversionKey::load(
            FormatTag::Bgr24,
            FormatTag::Grey8,
            MatrixKind::Dynamic
        )));
        assert!(!dispatcher.contains(&ConversionKey::load(
            FormatTag::Grey8,
            FormatTag::Grey8,
            MatrixKind::Dynamic
        )));
    }

    #[test]
    fn test_static_route_table() {
        assert!(static_load_route::<Grey8>(FormatTag::Grey8).is_some());
        assert!(static_load_route::<Grey8>(FormatTag::Bgr24).is_none());
        assert!(static_store_route::<Bgra32>(FormatTag::Bgra32).is_some());
    }

    #[test]
    fn test_static_beats_runtime() {
        let dispatcher = ConversionDispatcher::empty();
        let image = ImageBuffer::new(2, 3, FormatTag::Grey8).unwrap();
        let mut m = DynamicMatrix::<Grey8>::with_pixels(2, 3).unwrap();
        assert_eq!(dispatcher.load(&image.view(), &mut m).unwrap(), Route::Static);
    }

    #[test]
    fn test_empty_table_rejects_cross_format() {
        let dispatcher = ConversionDispatcher::empty();
        let image = ImageBuffer::new(2, 3, FormatTag::Bgr24).unwrap();
        let mut m = DynamicMatrix::<Grey8>::with_pixels(2, 3).unwrap();
        let err = dispatcher.load(&image.view(), &mut m).unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnsupportedConversion);
    }

    #[test]
    fn test_registered_routine_runs() {
        let mut dispatcher = ConversionDispatcher::new();
        let replaced = dispatcher.register_load::<Grey8>(FormatTag::Bgr24, MatrixKind::Dynamic, fail_load);
        assert!(replaced.is_some());

        let image = ImageBuffer::new(1, 1, FormatTag::Bgr24).unwrap();
        let mut m = DynamicMatrix::<Grey8>::with_pixels(1, 1).unwrap();
        let err = dispatcher.load(&image.view(), &mut m).unwrap_err();
        assert_eq!(err.message(), "custom routine ran");
    }

    #[test]
    fn test_size_checked_before_routine() {
        let mut dispatcher = ConversionDispatcher::new();
        dispatcher.register_load::<Grey8>(FormatTag::Bgr24, MatrixKind::Dynamic, fail_load);

        let image = ImageBuffer::new(4, 4, FormatTag::Bgr24).unwrap();
        let mut m = DynamicMatrix::<Grey8>::with_pixels(4, 3).unwrap();
        let err = dispatcher.load(&image.view(), &mut m).unwrap_err();
        assert_eq!(err.code(), ErrorCode::SizeMismatch);
    }

    #[test]
    fn test_key_display() {
        let key = ConversionKey::store(FormatTag::Grey8, FormatTag::Bgra32, MatrixKind::Fixed);
        assert_eq!(key.to_string(), "Store GREY_8 -> BGRA_32 (Fixed matrix)");
    }
}
