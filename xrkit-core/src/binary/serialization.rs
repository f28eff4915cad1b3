use super::{Error, MemorySink, ResultContextExt, Sink};

pub trait Serialize {
    fn serialize(&self, sink: &mut (impl Sink + ?Sized)) -> Result<(), Error>;
}

impl Serialize for () {
    fn serialize(&self, _: &mut (impl Sink + ?Sized)) -> Result<(), Error> {
        Ok(())
    }
}

macro_rules! serialize_primitive_le {
    ($T:ty) => {
        impl Serialize for $T {
            fn serialize(&self, sink: &mut (impl Sink + ?Sized)) -> Result<(), Error> {
                sink.write_bytes(&self.to_le_bytes())
            }
        }
    };
}

serialize_primitive_le!(u8);
serialize_primitive_le!(u16);
serialize_primitive_le!(u32);
serialize_primitive_le!(u64);

serialize_primitive_le!(i8);
serialize_primitive_le!(i16);
serialize_primitive_le!(i32);
serialize_primitive_le!(i64);

serialize_primitive_le!(f32);
serialize_primitive_le!(f64);

impl Serialize for bool {
    fn serialize(&self, sink: &mut (impl Sink + ?Sized)) -> Result<(), Error> {
        (*self as u8).serialize(sink)
    }
}

impl<T, const N: usize> Serialize for [T; N]
where
    T: Serialize,
{
    fn serialize(&self, sink: &mut (impl Sink + ?Sized)) -> Result<(), Error> {
        for (i, element) in self.iter().enumerate() {
            element
                .serialize(sink)
                .with_context(|| format!("cannot serialize array element at index {i}"))?;
        }
        Ok(())
    }
}

impl<T> Serialize for &T
where
    T: Serialize + ?Sized,
{
    fn serialize(&self, sink: &mut (impl Sink + ?Sized)) -> Result<(), Error> {
        (**self).serialize(sink)
    }
}

pub fn serialize(value: &impl Serialize) -> Result<Vec<u8>, Error> {
    let mut sink = MemorySink::new();
    value.serialize(&mut sink)?;
    Ok(sink.into_inner())
}
