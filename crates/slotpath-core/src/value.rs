// Dynamic value graph: declared types, values and map keys.
// Highlights:
// - `Type` describes a shape; `Type::zero` instantiates it.
// - `Value` is the tagged graph node. Containers keep their declared element
//   types so missing structure can be built while writing a path.
// - `Key` is a totally ordered map key; maps iterate in key order.
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Weak};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntWidth {
    W8,
    W16,
    W32,
    W64,
}

impl IntWidth {
    pub fn bits(self) -> u32 {
        match self {
            IntWidth::W8 => 8,
            IntWidth::W16 => 16,
            IntWidth::W32 => 32,
            IntWidth::W64 => 64,
        }
    }

    /// Truncates `v` to this width, sign-extending the result.
    pub fn wrap_int(self, v: i64) -> i64 {
        match self {
            IntWidth::W8 => v as i8 as i64,
            IntWidth::W16 => v as i16 as i64,
            IntWidth::W32 => v as i32 as i64,
            IntWidth::W64 => v,
        }
    }

    pub fn wrap_uint(self, v: u64) -> u64 {
        match self {
            IntWidth::W8 => v as u8 as u64,
            IntWidth::W16 => v as u16 as u64,
            IntWidth::W32 => v as u32 as u64,
            IntWidth::W64 => v,
        }
    }

    pub fn fits_int(self, v: i64) -> bool {
        self.wrap_int(v) == v
    }

    pub fn fits_uint(self, v: u64) -> bool {
        self.wrap_uint(v) == v
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatWidth {
    F32,
    F64,
}

impl FloatWidth {
    /// Rounds `v` to the precision of this width.
    pub fn round(self, v: f64) -> f64 {
        match self {
            FloatWidth::F32 => v as f32 as f64,
            FloatWidth::F64 => v,
        }
    }
}

/// Declared shape of a slot.
#[derive(Debug, Clone)]
pub enum Type {
    Bool,
    Int(IntWidth),
    Uint(IntWidth),
    Float(FloatWidth),
    Str,
    Record(Arc<RecordType>),
    /// Back-reference to an enclosing record type; see [`RecordType::cyclic`].
    RecordRef(Weak<RecordType>),
    Seq(Box<Type>),
    Array(Box<Type>, usize),
    Map(Box<Type>, Box<Type>),
    Ptr(Box<Type>),
    /// Holds a value of any type, or nothing.
    Any,
}

impl Type {
    pub fn seq(elem: Type) -> Self {
        Type::Seq(Box::new(elem))
    }

    pub fn array(elem: Type, len: usize) -> Self {
        Type::Array(Box::new(elem), len)
    }

    pub fn map(key: Type, elem: Type) -> Self {
        Type::Map(Box::new(key), Box::new(elem))
    }

    pub fn ptr(target: Type) -> Self {
        Type::Ptr(Box::new(target))
    }

    /// Instantiates the zero value: false, 0, "", zeroed records, empty
    /// sequences, zeroed arrays, nil maps, null pointers and empty `Any`.
    pub fn zero(&self) -> Value {
        match self {
            Type::Bool => Value::Bool(false),
            Type::Int(w) => Value::Int(*w, 0),
            Type::Uint(w) => Value::Uint(*w, 0),
            Type::Float(w) => Value::Float(*w, 0.0),
            Type::Str => Value::Str(String::new()),
            Type::Record(rt) => Value::Record(Record::zero(rt)),
            Type::RecordRef(weak) => match weak.upgrade() {
                Some(rt) => Value::Record(Record::zero(&rt)),
                None => Value::Any(None),
            },
            Type::Seq(elem) => Value::Seq(List::new((**elem).clone())),
            Type::Array(elem, len) => Value::Array(List {
                elem: (**elem).clone(),
                items: (0..*len).map(|_| elem.zero()).collect(),
            }),
            Type::Map(key, elem) => Value::Map(Map::nil((**key).clone(), (**elem).clone())),
            Type::Ptr(target) => Value::Ptr {
                target: (**target).clone(),
                to: None,
            },
            Type::Any => Value::Any(None),
        }
    }
}

// Record types compare by identity first. Back-references compare by
// identity only, which keeps recursive types from recursing here.
impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Type::Bool, Type::Bool) | (Type::Str, Type::Str) | (Type::Any, Type::Any) => true,
            (Type::Int(a), Type::Int(b)) | (Type::Uint(a), Type::Uint(b)) => a == b,
            (Type::Float(a), Type::Float(b)) => a == b,
            (Type::Record(a), Type::Record(b)) => Arc::ptr_eq(a, b) || a == b,
            (Type::Record(a), Type::RecordRef(b)) | (Type::RecordRef(b), Type::Record(a)) => {
                std::ptr::eq(Arc::as_ptr(a), b.as_ptr())
            }
            (Type::RecordRef(a), Type::RecordRef(b)) => a.ptr_eq(b),
            (Type::Seq(a), Type::Seq(b)) | (Type::Ptr(a), Type::Ptr(b)) => a == b,
            (Type::Array(a, n), Type::Array(b, m)) => n == m && a == b,
            (Type::Map(ka, ea), Type::Map(kb, eb)) => ka == kb && ea == eb,
            _ => false,
        }
    }
}

impl Eq for Type {}

impl From<Arc<RecordType>> for Type {
    fn from(rt: Arc<RecordType>) -> Self {
        Type::Record(rt)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordType {
    pub name: String,
    pub fields: Vec<FieldDef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    pub ty: Type,
    /// Unexported fields can be read but never written.
    pub exported: bool,
}

impl RecordType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, ty: Type) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            ty,
            exported: true,
        });
        self
    }

    pub fn private_field(mut self, name: impl Into<String>, ty: Type) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            ty,
            exported: false,
        });
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Builds a self-referencing record type. `build` receives the type of
    /// the record under construction, to be used behind a pointer, sequence
    /// or map; a record cannot hold itself directly.
    pub fn cyclic(build: impl FnOnce(Type) -> RecordType) -> Arc<Self> {
        Arc::new_cyclic(|this| build(Type::RecordRef(this.clone())))
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    ty: Arc<RecordType>,
    fields: Vec<Value>,
}

impl Record {
    pub fn zero(ty: &Arc<RecordType>) -> Self {
        Self {
            ty: Arc::clone(ty),
            fields: ty.fields.iter().map(|f| f.ty.zero()).collect(),
        }
    }

    /// Replaces the named field; unknown names are ignored.
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        if let Some(i) = self.ty.position(name) {
            self.fields[i] = value.into();
        }
        self
    }

    pub fn record_type(&self) -> &Arc<RecordType> {
        &self.ty
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.ty.position(name).map(|i| &self.fields[i])
    }

    pub fn values(&self) -> &[Value] {
        &self.fields
    }

    pub(crate) fn values_mut(&mut self) -> &mut [Value] {
        &mut self.fields
    }
}

/// Most elements a single indexed write may append to a sequence.
pub const MAX_GROWTH: usize = 1 << 20;

/// Element storage shared by `Value::Seq` and `Value::Array`.
#[derive(Debug, Clone, PartialEq)]
pub struct List {
    elem: Type,
    items: Vec<Value>,
}

impl List {
    pub fn new(elem: Type) -> Self {
        Self {
            elem,
            items: Vec::new(),
        }
    }

    pub fn with_items(elem: Type, items: Vec<Value>) -> Self {
        Self { elem, items }
    }

    pub fn elem_type(&self) -> &Type {
        &self.elem
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn items_mut(&mut self) -> &mut [Value] {
        &mut self.items
    }

    /// Pads with zero values up to `len` elements. Returns false, leaving the
    /// list untouched, when that means more than [`MAX_GROWTH`] new elements
    /// or the allocation fails.
    pub(crate) fn grow(&mut self, len: usize) -> bool {
        let extra = len.saturating_sub(self.items.len());
        if extra > MAX_GROWTH || self.items.try_reserve(extra).is_err() {
            return false;
        }
        while self.items.len() < len {
            self.items.push(self.elem.zero());
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Map {
    key: Type,
    elem: Type,
    entries: Option<BTreeMap<Key, Value>>,
}

impl Map {
    pub fn nil(key: Type, elem: Type) -> Self {
        Self {
            key,
            elem,
            entries: None,
        }
    }

    pub fn empty(key: Type, elem: Type) -> Self {
        Self {
            key,
            elem,
            entries: Some(BTreeMap::new()),
        }
    }

    pub fn with(mut self, key: impl Into<Key>, value: impl Into<Value>) -> Self {
        self.insert(key.into(), value.into());
        self
    }

    pub fn key_type(&self) -> &Type {
        &self.key
    }

    pub fn elem_type(&self) -> &Type {
        &self.elem
    }

    pub fn is_nil(&self) -> bool {
        self.entries.is_none()
    }

    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, key: &Key) -> Option<&Value> {
        self.entries.as_ref()?.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Value)> {
        self.entries.iter().flat_map(|e| e.iter())
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.iter().map(|(k, _)| k)
    }

    pub(crate) fn get_mut(&mut self, key: &Key) -> Option<&mut Value> {
        self.entries.as_mut()?.get_mut(key)
    }

    /// Inserts, allocating the entry table of a nil map first.
    pub fn insert(&mut self, key: Key, value: Value) {
        self.entries
            .get_or_insert_with(BTreeMap::new)
            .insert(key, value);
    }

    pub(crate) fn allocate(&mut self) {
        self.entries.get_or_insert_with(BTreeMap::new);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Bool,
    Int,
    Uint,
    Float,
    Str,
    Record,
    Seq,
    Array,
    Map,
    Ptr,
    Any,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(IntWidth, i64),
    Uint(IntWidth, u64),
    Float(FloatWidth, f64),
    Str(String),
    Record(Record),
    Seq(List),
    Array(List),
    Map(Map),
    /// Indirect reference; `to` is `None` for a null pointer.
    Ptr { target: Type, to: Option<Box<Value>> },
    /// Type-erased holder; `None` when empty.
    Any(Option<Box<Value>>),
}

impl Value {
    pub fn pointer(value: Value) -> Self {
        Value::Ptr {
            target: value.type_of(),
            to: Some(Box::new(value)),
        }
    }

    pub fn null(target: Type) -> Self {
        Value::Ptr { target, to: None }
    }

    pub fn any(value: Value) -> Self {
        Value::Any(Some(Box::new(value)))
    }

    pub fn kind(&self) -> Kind {
        match self {
            Value::Bool(_) => Kind::Bool,
            Value::Int(..) => Kind::Int,
            Value::Uint(..) => Kind::Uint,
            Value::Float(..) => Kind::Float,
            Value::Str(_) => Kind::Str,
            Value::Record(_) => Kind::Record,
            Value::Seq(_) => Kind::Seq,
            Value::Array(_) => Kind::Array,
            Value::Map(_) => Kind::Map,
            Value::Ptr { .. } => Kind::Ptr,
            Value::Any(_) => Kind::Any,
        }
    }

    pub fn type_of(&self) -> Type {
        match self {
            Value::Bool(_) => Type::Bool,
            Value::Int(w, _) => Type::Int(*w),
            Value::Uint(w, _) => Type::Uint(*w),
            Value::Float(w, _) => Type::Float(*w),
            Value::Str(_) => Type::Str,
            Value::Record(r) => Type::Record(Arc::clone(&r.ty)),
            Value::Seq(l) => Type::seq(l.elem.clone()),
            Value::Array(l) => Type::array(l.elem.clone(), l.items.len()),
            Value::Map(m) => Type::map(m.key.clone(), m.elem.clone()),
            Value::Ptr { target, .. } => Type::ptr(target.clone()),
            Value::Any(_) => Type::Any,
        }
    }

    /// Target of a non-null pointer or payload of a non-empty `Any`.
    pub fn pointee(&self) -> Option<&Value> {
        match self {
            Value::Ptr { to: Some(v), .. } | Value::Any(Some(v)) => Some(v),
            _ => None,
        }
    }

    pub fn into_pointee(self) -> Option<Value> {
        match self {
            Value::Ptr { to: Some(v), .. } | Value::Any(Some(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(IntWidth::W64, n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(IntWidth::W32, n as i64)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Uint(IntWidth::W64, n)
    }
}

impl From<u8> for Value {
    fn from(n: u8) -> Self {
        Value::Uint(IntWidth::W8, n as u64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(FloatWidth::F64, f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Record> for Value {
    fn from(r: Record) -> Self {
        Value::Record(r)
    }
}

impl From<Map> for Value {
    fn from(m: Map) -> Self {
        Value::Map(m)
    }
}

/// Map key. Floats order by `f64::total_cmp`.
#[derive(Debug, Clone)]
pub enum Key {
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Str(String),
}

impl Key {
    fn rank(&self) -> u8 {
        match self {
            Key::Bool(_) => 0,
            Key::Int(_) => 1,
            Key::Uint(_) => 2,
            Key::Float(_) => 3,
            Key::Str(_) => 4,
        }
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Key::Bool(a), Key::Bool(b)) => a.cmp(b),
            (Key::Int(a), Key::Int(b)) => a.cmp(b),
            (Key::Uint(a), Key::Uint(b)) => a.cmp(b),
            (Key::Float(a), Key::Float(b)) => a.total_cmp(b),
            (Key::Str(a), Key::Str(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Key {}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Bool(b) => write!(f, "{b}"),
            Key::Int(n) => write!(f, "{n}"),
            Key::Uint(n) => write!(f, "{n}"),
            Key::Float(x) => write!(f, "{x}"),
            Key::Str(s) => f.write_str(s),
        }
    }
}

impl From<bool> for Key {
    fn from(b: bool) -> Self {
        Key::Bool(b)
    }
}

impl From<i64> for Key {
    fn from(n: i64) -> Self {
        Key::Int(n)
    }
}

impl From<u64> for Key {
    fn from(n: u64) -> Self {
        Key::Uint(n)
    }
}

impl From<f64> for Key {
    fn from(x: f64) -> Self {
        Key::Float(x)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Str(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Str(s)
    }
}
