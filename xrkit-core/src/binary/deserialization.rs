use super::{ByteView, Error, Scalar};

pub trait Deserialize: Sized {
    fn deserialize(view: &mut ByteView<'_>) -> Result<Self, Error>;
}

impl Deserialize for () {
    fn deserialize(_: &mut ByteView<'_>) -> Result<Self, Error> {
        Ok(())
    }
}

macro_rules! deserialize_primitive_le {
    ($T:ty) => {
        impl Deserialize for $T {
            fn deserialize(view: &mut ByteView<'_>) -> Result<Self, Error> {
                let bytes = view.take(<$T as Scalar>::SIZE)?;
                Ok(<$T as Scalar>::from_le_slice(bytes))
            }
        }
    };
}

deserialize_primitive_le!(u8);
deserialize_primitive_le!(u16);
deserialize_primitive_le!(u32);
deserialize_primitive_le!(u64);

deserialize_primitive_le!(i8);
deserialize_primitive_le!(i16);
deserialize_primitive_le!(i32);
deserialize_primitive_le!(i64);

deserialize_primitive_le!(f32);
deserialize_primitive_le!(f64);

impl Deserialize for bool {
    fn deserialize(view: &mut ByteView<'_>) -> Result<Self, Error> {
        Ok(view.read::<u8>()? != 0)
    }
}

impl<T, const N: usize> Deserialize for [T; N]
where
    T: Deserialize + Default + Copy,
{
    fn deserialize(view: &mut ByteView<'_>) -> Result<Self, Error> {
        let mut array = [T::default(); N];
        view.read_into(&mut array)?;
        Ok(array)
    }
}

pub fn deserialize<T>(buffer: &[u8]) -> Result<T, Error>
where
    T: Deserialize,
{
    T::deserialize(&mut ByteView::new(buffer))
}
