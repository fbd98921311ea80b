use core_foundation::{
    array::CFArray,
    base::{CFIndex, CFTypeID, TCFType},
    boolean::CFBoolean,
    declare_TCFType, impl_CFTypeDescription, impl_TCFType,
    runloop::{CFRunLoopSource, CFRunLoopSourceRef},
    string::{CFString, CFStringRef},
};
use core_foundation_sys::base::CFRelease;
use core_graphics::geometry::{CGPoint, CGSize};
use std::ffi::c_void;
use std::ptr;

use fusuma_core::{AttrValue, Attribute, AxError, Point, Size};

pub type AXErrorCode = i32;
pub const AX_ERROR_SUCCESS: AXErrorCode = 0;
pub const AX_ERROR_FAILURE: AXErrorCode = -25200;
pub const AX_ERROR_INVALID_UIELEMENT: AXErrorCode = -25202;
pub const AX_ERROR_ATTRIBUTE_UNSUPPORTED: AXErrorCode = -25205;
pub const AX_ERROR_API_DISABLED: AXErrorCode = -25211;
pub const AX_ERROR_NO_VALUE: AXErrorCode = -25212;

#[repr(C)]
pub struct __AXUIElement(c_void);
pub type AXUIElementRef = *mut __AXUIElement;

declare_TCFType!(AXUIElement, AXUIElementRef);
impl_TCFType!(AXUIElement, AXUIElementRef, AXUIElementGetTypeID);
impl_CFTypeDescription!(AXUIElement);

#[repr(C)]
pub struct __AXObserver(c_void);
pub type AXObserverRef = *mut __AXObserver;

declare_TCFType!(AXObserver, AXObserverRef);
impl_TCFType!(AXObserver, AXObserverRef, AXObserverGetTypeID);

pub type AXObserverCallback = extern "C" fn(
    observer: AXObserverRef,
    element: AXUIElementRef,
    notification: CFStringRef,
    refcon: *mut c_void,
);

#[link(name = "ApplicationServices", kind = "framework")]
extern "C" {
    fn AXUIElementGetTypeID() -> CFTypeID;
    fn AXObserverGetTypeID() -> CFTypeID;
    fn AXIsProcessTrusted() -> bool;
    fn AXIsProcessTrustedWithOptions(options: *const c_void) -> bool;
    fn AXUIElementCreateApplication(pid: i32) -> AXUIElementRef;
    fn AXUIElementCopyAttributeValue(
        element: AXUIElementRef,
        attribute: CFStringRef,
        value: *mut *mut c_void,
    ) -> AXErrorCode;
    fn AXUIElementSetAttributeValue(
        element: AXUIElementRef,
        attribute: CFStringRef,
        value: *const c_void,
    ) -> AXErrorCode;
    fn AXUIElementIsAttributeSettable(
        element: AXUIElementRef,
        attribute: CFStringRef,
        settable: *mut u8,
    ) -> AXErrorCode;
    fn AXUIElementGetAttributeValueCount(
        element: AXUIElementRef,
        attribute: CFStringRef,
        count: *mut CFIndex,
    ) -> AXErrorCode;
    fn AXValueCreate(value_type: u32, value: *const c_void) -> *mut c_void;
    fn AXValueGetValue(value: *const c_void, value_type: u32, value_ptr: *mut c_void) -> bool;
    fn AXObserverCreate(
        application: i32,
        callback: AXObserverCallback,
        observer: *mut AXObserverRef,
    ) -> AXErrorCode;
    fn AXObserverAddNotification(
        observer: AXObserverRef,
        element: AXUIElementRef,
        notification: CFStringRef,
        refcon: *mut c_void,
    ) -> AXErrorCode;
    fn AXObserverRemoveNotification(
        observer: AXObserverRef,
        element: AXUIElementRef,
        notification: CFStringRef,
    ) -> AXErrorCode;
    fn AXObserverGetRunLoopSource(observer: AXObserverRef) -> CFRunLoopSourceRef;
}

const AX_VALUE_TYPE_CGPOINT: u32 = 1;
const AX_VALUE_TYPE_CGSIZE: u32 = 2;

pub fn is_trusted() -> bool {
    unsafe { AXIsProcessTrusted() }
}

pub fn is_trusted_with_prompt() -> bool {
    use core_foundation::dictionary::CFDictionary;

    let key = CFString::new("AXTrustedCheckOptionPrompt");
    let dict = CFDictionary::from_CFType_pairs(&[(key, CFBoolean::true_value())]);

    unsafe { AXIsProcessTrustedWithOptions(dict.as_concrete_TypeRef() as *const c_void) }
}

/// Native status to the provider error for a read of `attribute`.
pub fn read_error(code: AXErrorCode, attribute: Attribute) -> AxError {
    match code {
        AX_ERROR_API_DISABLED => AxError::PermissionDenied,
        AX_ERROR_INVALID_UIELEMENT => AxError::NotAccessible,
        AX_ERROR_ATTRIBUTE_UNSUPPORTED | AX_ERROR_NO_VALUE => {
            AxError::AttributeUnavailable(attribute)
        }
        code => AxError::Failure(code),
    }
}

/// Native status to the provider error for a write of `attribute`.
pub fn write_error(code: AXErrorCode, attribute: Attribute) -> AxError {
    match code {
        AX_ERROR_ATTRIBUTE_UNSUPPORTED => AxError::Unwritable(attribute),
        code => read_error(code, attribute),
    }
}

impl AXUIElement {
    pub fn application(pid: i32) -> Self {
        unsafe {
            let raw = AXUIElementCreateApplication(pid);
            Self::wrap_under_create_rule(raw)
        }
    }

    fn copy_attribute(&self, attribute: Attribute) -> Result<*mut c_void, AXErrorCode> {
        let attr = CFString::new(attribute.name());
        let mut value: *mut c_void = ptr::null_mut();
        let err = unsafe {
            AXUIElementCopyAttributeValue(
                self.as_concrete_TypeRef(),
                attr.as_concrete_TypeRef(),
                &mut value,
            )
        };
        if err == AX_ERROR_SUCCESS && !value.is_null() {
            Ok(value)
        } else if err == AX_ERROR_SUCCESS {
            Err(AX_ERROR_NO_VALUE)
        } else {
            Err(err)
        }
    }

    fn set_attribute(&self, attribute: Attribute, value: *const c_void) -> Result<(), AXErrorCode> {
        let attr = CFString::new(attribute.name());
        let err = unsafe {
            AXUIElementSetAttributeValue(
                self.as_concrete_TypeRef(),
                attr.as_concrete_TypeRef(),
                value,
            )
        };
        if err == AX_ERROR_SUCCESS {
            Ok(())
        } else {
            Err(err)
        }
    }

    pub fn get(&self, attribute: Attribute) -> Result<AttrValue, AxError> {
        let value = self
            .copy_attribute(attribute)
            .map_err(|code| read_error(code, attribute))?;

        match attribute {
            Attribute::Role | Attribute::Title => {
                let cf = unsafe { CFString::wrap_under_create_rule(value as CFStringRef) };
                Ok(AttrValue::Text(cf.to_string()))
            }
            Attribute::Hidden | Attribute::Minimized => {
                let cf = unsafe { CFBoolean::wrap_under_create_rule(value as *const _) };
                Ok(AttrValue::Bool(cf.into()))
            }
            Attribute::Position => {
                let mut point = CGPoint::new(0.0, 0.0);
                let ok = unsafe {
                    let ok = AXValueGetValue(
                        value,
                        AX_VALUE_TYPE_CGPOINT,
                        &mut point as *mut CGPoint as *mut c_void,
                    );
                    CFRelease(value);
                    ok
                };
                if !ok {
                    return Err(AxError::Failure(AX_ERROR_FAILURE));
                }
                Ok(AttrValue::Point(Point::new(point.x as i32, point.y as i32)))
            }
            Attribute::Size => {
                let mut size = CGSize::new(0.0, 0.0);
                let ok = unsafe {
                    let ok = AXValueGetValue(
                        value,
                        AX_VALUE_TYPE_CGSIZE,
                        &mut size as *mut CGSize as *mut c_void,
                    );
                    CFRelease(value);
                    ok
                };
                if !ok {
                    return Err(AxError::Failure(AX_ERROR_FAILURE));
                }
                Ok(AttrValue::Size(Size::new(
                    size.width.max(0.0) as u32,
                    size.height.max(0.0) as u32,
                )))
            }
            Attribute::Windows => {
                unsafe { CFRelease(value) };
                Err(AxError::AttributeUnavailable(attribute))
            }
        }
    }

    pub fn set(&self, attribute: Attribute, value: AttrValue) -> Result<(), AxError> {
        let result = match value {
            AttrValue::Point(p) => {
                let point = CGPoint::new(p.x as f64, p.y as f64);
                self.set_ax_value(
                    attribute,
                    AX_VALUE_TYPE_CGPOINT,
                    &point as *const CGPoint as *const c_void,
                )
            }
            AttrValue::Size(s) => {
                let size = CGSize::new(s.width as f64, s.height as f64);
                self.set_ax_value(
                    attribute,
                    AX_VALUE_TYPE_CGSIZE,
                    &size as *const CGSize as *const c_void,
                )
            }
            AttrValue::Bool(b) => {
                let cf = if b {
                    CFBoolean::true_value()
                } else {
                    CFBoolean::false_value()
                };
                self.set_attribute(attribute, cf.as_concrete_TypeRef() as *const c_void)
            }
            AttrValue::Text(s) => {
                let cf = CFString::new(&s);
                self.set_attribute(attribute, cf.as_concrete_TypeRef() as *const c_void)
            }
        };
        result.map_err(|code| write_error(code, attribute))
    }

    fn set_ax_value(
        &self,
        attribute: Attribute,
        value_type: u32,
        value: *const c_void,
    ) -> Result<(), AXErrorCode> {
        let ax_value = unsafe { AXValueCreate(value_type, value) };
        if ax_value.is_null() {
            return Err(AX_ERROR_FAILURE);
        }
        let result = self.set_attribute(attribute, ax_value);
        unsafe { CFRelease(ax_value) };
        result
    }

    pub fn is_settable(&self, attribute: Attribute) -> bool {
        let attr = CFString::new(attribute.name());
        let mut settable: u8 = 0;
        let err = unsafe {
            AXUIElementIsAttributeSettable(
                self.as_concrete_TypeRef(),
                attr.as_concrete_TypeRef(),
                &mut settable,
            )
        };
        err == AX_ERROR_SUCCESS && settable != 0
    }

    pub fn count(&self, attribute: Attribute) -> Result<usize, AxError> {
        let attr = CFString::new(attribute.name());
        let mut count: CFIndex = 0;
        let err = unsafe {
            AXUIElementGetAttributeValueCount(
                self.as_concrete_TypeRef(),
                attr.as_concrete_TypeRef(),
                &mut count,
            )
        };
        if err == AX_ERROR_SUCCESS {
            Ok(count.max(0) as usize)
        } else {
            Err(read_error(err, attribute))
        }
    }

    pub fn children(&self, attribute: Attribute) -> Result<Vec<AXUIElement>, AxError> {
        let value = self
            .copy_attribute(attribute)
            .map_err(|code| read_error(code, attribute))?;
        let arr: CFArray = unsafe { CFArray::wrap_under_create_rule(value as *const _) };
        let mut result = Vec::with_capacity(arr.len() as usize);
        for i in 0..arr.len() {
            let elem = unsafe {
                let ptr = *arr.get_unchecked(i);
                AXUIElement::wrap_under_get_rule(ptr as AXUIElementRef)
            };
            result.push(elem);
        }
        Ok(result)
    }
}

impl AXObserver {
    pub fn new(pid: i32, callback: AXObserverCallback) -> Result<Self, AxError> {
        let mut raw: AXObserverRef = ptr::null_mut();
        let err = unsafe { AXObserverCreate(pid, callback, &mut raw) };
        match err {
            AX_ERROR_SUCCESS if !raw.is_null() => {}
            AX_ERROR_API_DISABLED => return Err(AxError::PermissionDenied),
            AX_ERROR_INVALID_UIELEMENT => return Err(AxError::NotAccessible),
            code => return Err(AxError::Failure(code)),
        }
        Ok(unsafe { Self::wrap_under_create_rule(raw) })
    }

    pub fn add_notification(
        &self,
        element: &AXUIElement,
        notification: &str,
        refcon: *mut c_void,
    ) -> Result<(), AXErrorCode> {
        let name = CFString::new(notification);
        let err = unsafe {
            AXObserverAddNotification(
                self.as_concrete_TypeRef(),
                element.as_concrete_TypeRef(),
                name.as_concrete_TypeRef(),
                refcon,
            )
        };
        if err == AX_ERROR_SUCCESS {
            Ok(())
        } else {
            Err(err)
        }
    }

    pub fn remove_notification(&self, element: &AXUIElement, notification: &str) {
        let name = CFString::new(notification);
        unsafe {
            AXObserverRemoveNotification(
                self.as_concrete_TypeRef(),
                element.as_concrete_TypeRef(),
                name.as_concrete_TypeRef(),
            );
        }
    }

    pub fn run_loop_source(&self) -> CFRunLoopSource {
        unsafe {
            let raw = AXObserverGetRunLoopSource(self.as_concrete_TypeRef());
            CFRunLoopSource::wrap_under_get_rule(raw)
        }
    }
}
