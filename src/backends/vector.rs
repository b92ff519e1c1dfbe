use std::borrow::Cow;

/// A trait for vector-like types that can be used as evaluation points.
///
/// Equations read their inputs through this trait so that plain slices, arrays, `Vec`s
/// and the `ndarray` / `nalgebra` vector types can be passed interchangeably.
/// Contiguous containers hand out their storage directly; anything else is copied.
///
/// # Examples
///
/// ```rust
/// use evalexpr_symdiff::prelude::Vector;
///
/// let point = vec![1.0, 2.0, 3.0];
/// assert_eq!(Vector::len(&point), 3);
/// assert_eq!(point.values()[0], 1.0);
/// ```
pub trait Vector {
    /// Returns the elements in order, borrowed when the storage is contiguous.
    fn values(&self) -> Cow<'_, [f64]>;

    /// Returns the length of the vector.
    fn len(&self) -> usize;

    /// Checks if the vector is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Vector for [f64] {
    fn values(&self) -> Cow<'_, [f64]> {
        Cow::Borrowed(self)
    }

    fn len(&self) -> usize {
        <[f64]>::len(self)
    }
}

impl Vector for Vec<f64> {
    fn values(&self) -> Cow<'_, [f64]> {
        Cow::Borrowed(self.as_slice())
    }

    fn len(&self) -> usize {
        self.as_slice().len()
    }
}

/// Implementation of Vector trait for fixed-size arrays.
///
/// # Type Parameters
/// * `N` - The fixed size of the array
impl<const N: usize> Vector for [f64; N] {
    fn values(&self) -> Cow<'_, [f64]> {
        Cow::Borrowed(self.as_slice())
    }

    fn len(&self) -> usize {
        N
    }
}

/// Implementation of Vector trait for ndarray's Array1<f64>.
///
/// Arrays in standard layout are borrowed. Strided views such as a column of a
/// row-major matrix are not contiguous and are copied into a new buffer.
#[cfg(feature = "ndarray")]
impl Vector for ndarray::Array1<f64> {
    fn values(&self) -> Cow<'_, [f64]> {
        match self.as_slice() {
            Some(slice) => Cow::Borrowed(slice),
            None => Cow::Owned(self.iter().copied().collect()),
        }
    }

    fn len(&self) -> usize {
        self.len()
    }
}

/// Implementation of Vector trait for nalgebra's DVector<f64>.
#[cfg(feature = "nalgebra")]
impl Vector for nalgebra::DVector<f64> {
    fn values(&self) -> Cow<'_, [f64]> {
        Cow::Borrowed(self.as_slice())
    }

    fn len(&self) -> usize {
        self.len()
    }
}
