//! Serializer adapter that refuses blocked types.
//!
//! [`Guard`] forwards every call to the wrapped serializer. Before a named
//! container (struct, tuple struct, newtype, unit struct or enum variant) is
//! written, its serde name is looked up in the [`Blocklist`]. A hit aborts with
//! the wrapped format's own error type. Nested values are re-wrapped so the
//! check applies at every depth.
//!
//! Fields marked `#[serde(flatten)]` are not covered. Serde writes them
//! through its own map serializer, which discards the container name before
//! the guard sees anything, so a blocked type flattened into an allowed one
//! is written as plain map entries. Maps and sequences likewise carry no
//! name; they are only refused by path when they are the top-level value.

use crate::core::blocklist::Blocklist;
use crate::core::BlockedType;
use crate::utils::error::{BlocklistError, Result};
use serde::ser::{
    self, Serialize, SerializeMap, SerializeSeq, SerializeStruct, SerializeStructVariant,
    SerializeTuple, SerializeTupleStruct, SerializeTupleVariant, Serializer,
};
use std::cell::RefCell;
use std::fmt::Display;

struct GuardState<'a> {
    blocklist: &'a Blocklist,
    hit: RefCell<Option<BlockedType>>,
}

impl GuardState<'_> {
    fn refuse<E: ser::Error>(&self, rule: &BlockedType) -> E {
        tracing::warn!("Refused to serialize disallowed type {} ({})", rule.name, rule.origin);
        let mut hit = self.hit.borrow_mut();
        if hit.is_none() {
            *hit = Some(rule.clone());
        }
        E::custom(rule.message())
    }

    fn check<E: ser::Error>(&self, name: &str) -> std::result::Result<(), E> {
        match self.blocklist.rule_for(name) {
            Some(rule) => Err(self.refuse(rule)),
            None => Ok(()),
        }
    }
}

/// A value paired with the blocklist it must pass. Serializable with any format.
pub struct Screened<'a, T: ?Sized> {
    value: &'a T,
    state: GuardState<'a>,
}

impl<'a, T: ?Sized + Serialize> Screened<'a, T> {
    pub(crate) fn new(blocklist: &'a Blocklist, value: &'a T) -> Self {
        Self {
            value,
            state: GuardState {
                blocklist,
                hit: RefCell::new(None),
            },
        }
    }

    /// Rule that stopped the most recent serialization, if any.
    pub fn blocked(&self) -> Option<BlockedType> {
        self.state.hit.borrow().clone()
    }

    /// Maps a JSON result, turning a blocked type into [`BlocklistError::Disallowed`].
    pub fn finish<R>(self, result: serde_json::Result<R>) -> Result<R> {
        match result {
            Ok(value) => Ok(value),
            Err(e) => match self.state.hit.into_inner() {
                Some(rule) => Err(BlocklistError::Disallowed {
                    type_name: rule.name,
                    origin: rule.origin,
                }),
                None => Err(BlocklistError::SerializationError(e)),
            },
        }
    }
}

impl<T: ?Sized + Serialize> Serialize for Screened<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.state.hit.borrow_mut().take();
        if let Some(rule) = self.state.blocklist.rule_for_path(std::any::type_name::<T>()) {
            return Err(self.state.refuse(rule));
        }
        self.value.serialize(Guard {
            inner: serializer,
            state: &self.state,
        })
    }
}

struct Guarded<'a, T: ?Sized> {
    value: &'a T,
    state: &'a GuardState<'a>,
}

impl<T: ?Sized + Serialize> Serialize for Guarded<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.value.serialize(Guard {
            inner: serializer,
            state: self.state,
        })
    }
}

/// Serializer wrapper. Built by [`Screened`]; not constructed directly.
pub struct Guard<'a, S> {
    inner: S,
    state: &'a GuardState<'a>,
}

impl<'a, S> Guard<'a, S> {
    fn wrap<'v, T: ?Sized>(&self, value: &'v T) -> Guarded<'v, T>
    where
        'a: 'v,
    {
        Guarded {
            value,
            state: self.state,
        }
    }
}

pub struct Compound<'a, C> {
    inner: C,
    state: &'a GuardState<'a>,
}

impl<'a, C> Compound<'a, C> {
    fn wrap<'v, T: ?Sized>(&self, value: &'v T) -> Guarded<'v, T>
    where
        'a: 'v,
    {
        Guarded {
            value,
            state: self.state,
        }
    }
}

impl<'a, S: Serializer> Serializer for Guard<'a, S> {
    type Ok = S::Ok;
    type Error = S::Error;
    type SerializeSeq = Compound<'a, S::SerializeSeq>;
    type SerializeTuple = Compound<'a, S::SerializeTuple>;
    type SerializeTupleStruct = Compound<'a, S::SerializeTupleStruct>;
    type SerializeTupleVariant = Compound<'a, S::SerializeTupleVariant>;
    type SerializeMap = Compound<'a, S::SerializeMap>;
    type SerializeStruct = Compound<'a, S::SerializeStruct>;
    type SerializeStructVariant = Compound<'a, S::SerializeStructVariant>;

    fn serialize_bool(self, v: bool) -> std::result::Result<S::Ok, S::Error> {
        self.inner.serialize_bool(v)
    }

    fn serialize_i8(self, v: i8) -> std::result::Result<S::Ok, S::Error> {
        self.inner.serialize_i8(v)
    }

    fn serialize_i16(self, v: i16) -> std::result::Result<S::Ok, S::Error> {
        self.inner.serialize_i16(v)
    }

    fn serialize_i32(self, v: i32) -> std::result::Result<S::Ok, S::Error> {
        self.inner.serialize_i32(v)
    }

    fn serialize_i64(self, v: i64) -> std::result::Result<S::Ok, S::Error> {
        self.inner.serialize_i64(v)
    }

    fn serialize_i128(self, v: i128) -> std::result::Result<S::Ok, S::Error> {
        self.inner.serialize_i128(v)
    }

    fn serialize_u8(self, v: u8) -> std::result::Result<S::Ok, S::Error> {
        self.inner.serialize_u8(v)
    }

    fn serialize_u16(self, v: u16) -> std::result::Result<S::Ok, S::Error> {
        self.inner.serialize_u16(v)
    }

    fn serialize_u32(self, v: u32) -> std::result::Result<S::Ok, S::Error> {
        self.inner.serialize_u32(v)
    }

    fn serialize_u64(self, v: u64) -> std::result::Result<S::Ok, S::Error> {
        self.inner.serialize_u64(v)
    }

    fn serialize_u128(self, v: u128) -> std::result::Result<S::Ok, S::Error> {
        self.inner.serialize_u128(v)
    }

    fn serialize_f32(self, v: f32) -> std::result::Result<S::Ok, S::Error> {
        self.inner.serialize_f32(v)
    }

    fn serialize_f64(self, v: f64) -> std::result::Result<S::Ok, S::Error> {
        self.inner.serialize_f64(v)
    }

    fn serialize_char(self, v: char) -> std::result::Result<S::Ok, S::Error> {
        self.inner.serialize_char(v)
    }

    fn serialize_str(self, v: &str) -> std::result::Result<S::Ok, S::Error> {
        self.inner.serialize_str(v)
    }

    fn serialize_bytes(self, v: &[u8]) -> std::result::Result<S::Ok, S::Error> {
        self.inner.serialize_bytes(v)
    }

    fn serialize_none(self) -> std::result::Result<S::Ok, S::Error> {
        self.inner.serialize_none()
    }

    fn serialize_some<T>(self, value: &T) -> std::result::Result<S::Ok, S::Error>
    where
        T: ?Sized + Serialize,
    {
        let value = self.wrap(value);
        self.inner.serialize_some(&value)
    }

    fn serialize_unit(self) -> std::result::Result<S::Ok, S::Error> {
        self.inner.serialize_unit()
    }

    fn serialize_unit_struct(self, name: &'static str) -> std::result::Result<S::Ok, S::Error> {
        self.state.check::<S::Error>(name)?;
        self.inner.serialize_unit_struct(name)
    }

    fn serialize_unit_variant(
        self,
        name: &'static str,
        variant_index: u32,
        variant: &'static str,
    ) -> std::result::Result<S::Ok, S::Error> {
        self.state.check::<S::Error>(name)?;
        self.inner.serialize_unit_variant(name, variant_index, variant)
    }

    fn serialize_newtype_struct<T>(
        self,
        name: &'static str,
        value: &T,
    ) -> std::result::Result<S::Ok, S::Error>
    where
        T: ?Sized + Serialize,
    {
        self.state.check::<S::Error>(name)?;
        let value = self.wrap(value);
        self.inner.serialize_newtype_struct(name, &value)
    }

    fn serialize_newtype_variant<T>(
        self,
        name: &'static str,
        variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> std::result::Result<S::Ok, S::Error>
    where
        T: ?Sized + Serialize,
    {
        self.state.check::<S::Error>(name)?;
        let value = self.wrap(value);
        self.inner
            .serialize_newtype_variant(name, variant_index, variant, &value)
    }

    fn serialize_seq(self, len: Option<usize>) -> std::result::Result<Self::SerializeSeq, S::Error> {
        let inner = self.inner.serialize_seq(len)?;
        Ok(Compound {
            inner,
            state: self.state,
        })
    }

    fn serialize_tuple(self, len: usize) -> std::result::Result<Self::SerializeTuple, S::Error> {
        let inner = self.inner.serialize_tuple(len)?;
        Ok(Compound {
            inner,
            state: self.state,
        })
    }

    fn serialize_tuple_struct(
        self,
        name: &'static str,
        len: usize,
    ) -> std::result::Result<Self::SerializeTupleStruct, S::Error> {
        self.state.check::<S::Error>(name)?;
        let state = self.state;
        let inner = self.inner.serialize_tuple_struct(name, len)?;
        Ok(Compound { inner, state })
    }

    fn serialize_tuple_variant(
        self,
        name: &'static str,
        variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> std::result::Result<Self::SerializeTupleVariant, S::Error> {
        self.state.check::<S::Error>(name)?;
        let state = self.state;
        let inner = self
            .inner
            .serialize_tuple_variant(name, variant_index, variant, len)?;
        Ok(Compound { inner, state })
    }

    fn serialize_map(self, len: Option<usize>) -> std::result::Result<Self::SerializeMap, S::Error> {
        let state = self.state;
        let inner = self.inner.serialize_map(len)?;
        Ok(Compound { inner, state })
    }

    fn serialize_struct(
        self,
        name: &'static str,
        len: usize,
    ) -> std::result::Result<Self::SerializeStruct, S::Error> {
        self.state.check::<S::Error>(name)?;
        let state = self.state;
        let inner = self.inner.serialize_struct(name, len)?;
        Ok(Compound { inner, state })
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> std::result::Result<Self::SerializeStructVariant, S::Error> {
        self.state.check::<S::Error>(name)?;
        let state = self.state;
        let inner = self
            .inner
            .serialize_struct_variant(name, variant_index, variant, len)?;
        Ok(Compound { inner, state })
    }

    fn collect_str<T>(self, value: &T) -> std::result::Result<S::Ok, S::Error>
    where
        T: ?Sized + Display,
    {
        self.inner.collect_str(value)
    }

    fn is_human_readable(&self) -> bool {
        self.inner.is_human_readable()
    }
}

impl<C: SerializeSeq> SerializeSeq for Compound<'_, C> {
    type Ok = C::Ok;
    type Error = C::Error;

    fn serialize_element<T>(&mut self, value: &T) -> std::result::Result<(), C::Error>
    where
        T: ?Sized + Serialize,
    {
        let value = self.wrap(value);
        self.inner.serialize_element(&value)
    }

    fn end(self) -> std::result::Result<C::Ok, C::Error> {
        self.inner.end()
    }
}

impl<C: SerializeTuple> SerializeTuple for Compound<'_, C> {
    type Ok = C::Ok;
    type Error = C::Error;

    fn serialize_element<T>(&mut self, value: &T) -> std::result::Result<(), C::Error>
    where
        T: ?Sized + Serialize,
    {
        let value = self.wrap(value);
        self.inner.serialize_element(&value)
    }

    fn end(self) -> std::result::Result<C::Ok, C::Error> {
        self.inner.end()
    }
}

impl<C: SerializeTupleStruct> SerializeTupleStruct for Compound<'_, C> {
    type Ok = C::Ok;
    type Error = C::Error;

    fn serialize_field<T>(&mut self, value: &T) -> std::result::Result<(), C::Error>
    where
        T: ?Sized + Serialize,
    {
        let value = self.wrap(value);
        self.inner.serialize_field(&value)
    }

    fn end(self) -> std::result::Result<C::Ok, C::Error> {
        self.inner.end()
    }
}

impl<C: SerializeTupleVariant> SerializeTupleVariant for Compound<'_, C> {
    type Ok = C::Ok;
    type Error = C::Error;

    fn serialize_field<T>(&mut self, value: &T) -> std::result::Result<(), C::Error>
    where
        T: ?Sized + Serialize,
    {
        let value = self.wrap(value);
        self.inner.serialize_field(&value)
    }

    fn end(self) -> std::result::Result<C::Ok, C::Error> {
        self.inner.end()
    }
}

impl<C: SerializeMap> SerializeMap for Compound<'_, C> {
    type Ok = C::Ok;
    type Error = C::Error;

    fn serialize_key<T>(&mut self, key: &T) -> std::result::Result<(), C::Error>
    where
        T: ?Sized + Serialize,
    {
        let key = self.wrap(key);
        self.inner.serialize_key(&key)
    }

    fn serialize_value<T>(&mut self, value: &T) -> std::result::Result<(), C::Error>
    where
        T: ?Sized + Serialize,
    {
        let value = self.wrap(value);
        self.inner.serialize_value(&value)
    }

    fn serialize_entry<K, V>(&mut self, key: &K, value: &V) -> std::result::Result<(), C::Error>
    where
        K: ?Sized + Serialize,
        V: ?Sized + Serialize,
    {
        let key = self.wrap(key);
        let value = self.wrap(value);
        self.inner.serialize_entry(&key, &value)
    }

    fn end(self) -> std::result::Result<C::Ok, C::Error> {
        self.inner.end()
    }
}

impl<C: SerializeStruct> SerializeStruct for Compound<'_, C> {
    type Ok = C::Ok;
    type Error = C::Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> std::result::Result<(), C::Error>
    where
        T: ?Sized + Serialize,
    {
        let value = self.wrap(value);
        self.inner.serialize_field(key, &value)
    }

    fn skip_field(&mut self, key: &'static str) -> std::result::Result<(), C::Error> {
        self.inner.skip_field(key)
    }

    fn end(self) -> std::result::Result<C::Ok, C::Error> {
        self.inner.end()
    }
}

impl<C: SerializeStructVariant> SerializeStructVariant for Compound<'_, C> {
    type Ok = C::Ok;
    type Error = C::Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> std::result::Result<(), C::Error>
    where
        T: ?Sized + Serialize,
    {
        let value = self.wrap(value);
        self.inner.serialize_field(key, &value)
    }

    fn skip_field(&mut self, key: &'static str) -> std::result::Result<(), C::Error> {
        self.inner.skip_field(key)
    }

    fn end(self) -> std::result::Result<C::Ok, C::Error> {
        self.inner.end()
    }
}
